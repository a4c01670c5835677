//! Recursive descent parser producing an [`Expr`] tree
//!
//! Precedence, loosest first:
//! `if`, `or`, `and`, comparison / `between` / `in`, `+ -`, `* /`, `**`,
//! unary minus, then path (`.`) and filter (`[]`) postfixes.

use serde_json::Value;

use super::ast::{BinaryOp, Expr};
use super::error::ExpressionError;
use super::functions::Function;
use super::lexer::{tokenize, Token, TokenKind};
use super::value::float_value;

const KEYWORDS: [&str; 6] = ["and", "or", "then", "else", "between", "in"];

/// Deepest syntax tree the parser builds; evaluation recurses once per level
const MAX_DEPTH: usize = 256;

/// Parse expression source into a syntax tree
pub fn parse(source: &str) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };

    let expr = parser.expression()?;

    let token = parser.peek();
    if token.kind != TokenKind::Eof {
        return Err(ExpressionError::parse(
            token.offset,
            format!("unexpected {}", describe(&token.kind)),
        ));
    }

    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Go one level deeper into the tree. Errors abort the whole parse,
    /// so only successful paths call [`Parser::leave`].
    fn enter(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;

        if self.depth > MAX_DEPTH {
            return Err(ExpressionError::parse(
                self.peek().offset,
                "expression nested too deeply",
            ));
        }
        Ok(())
    }

    fn leave(&mut self, levels: usize) {
        self.depth -= levels;
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> &Token {
        let index = (self.pos + ahead).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Name(name) if name == keyword)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ExpressionError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            Err(ExpressionError::parse(
                token.offset,
                format!("expected {} but found {}", describe(&kind), describe(&token.kind)),
            ))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ExpressionError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            let token = self.peek();
            Err(ExpressionError::parse(
                token.offset,
                format!("expected '{}' but found {}", keyword, describe(&token.kind)),
            ))
        }
    }

    fn expression(&mut self) -> Result<Expr, ExpressionError> {
        self.enter()?;
        let expr = self.conditional()?;
        self.leave(1);

        Ok(expr)
    }

    fn conditional(&mut self) -> Result<Expr, ExpressionError> {
        if self.eat_keyword("if") {
            let condition = self.expression()?;
            self.expect_keyword("then")?;
            let then_branch = self.expression()?;
            self.expect_keyword("else")?;
            let else_branch = self.expression()?;

            return Ok(Expr::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }

        self.disjunction()
    }

    fn disjunction(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.conjunction()?;
        let mut levels = 0;

        while self.eat_keyword("or") {
            self.enter()?;
            levels += 1;
            let right = self.conjunction()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }

        self.leave(levels);
        Ok(left)
    }

    fn conjunction(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.comparison()?;
        let mut levels = 0;

        while self.eat_keyword("and") {
            self.enter()?;
            levels += 1;
            let right = self.comparison()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }

        self.leave(levels);
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expr, ExpressionError> {
        let left = self.additive()?;

        if self.eat_keyword("between") {
            let low = self.additive()?;
            self.expect_keyword("and")?;
            let high = self.additive()?;

            return Ok(Expr::Between {
                value: Box::new(left),
                low: Box::new(low),
                high: Box::new(high),
            });
        }

        if self.eat_keyword("in") {
            let right = self.additive()?;
            return Ok(Expr::In(Box::new(left), Box::new(right)));
        }

        let op = match self.peek().kind {
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::NotEq,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            _ => return Ok(left),
        };
        self.advance();

        let right = self.additive()?;
        Ok(Expr::binary(op, left, right))
    }

    fn additive(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.multiplicative()?;
        let mut levels = 0;

        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            self.enter()?;
            levels += 1;

            let right = self.multiplicative()?;
            left = Expr::binary(op, left, right);
        }

        self.leave(levels);
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.power()?;
        let mut levels = 0;

        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            self.enter()?;
            levels += 1;

            let right = self.power()?;
            left = Expr::binary(op, left, right);
        }

        self.leave(levels);
        Ok(left)
    }

    fn power(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.unary()?;
        let mut levels = 0;

        while self.eat(&TokenKind::StarStar) {
            self.enter()?;
            levels += 1;
            let right = self.unary()?;
            left = Expr::binary(BinaryOp::Pow, left, right);
        }

        self.leave(levels);
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ExpressionError> {
        if self.eat(&TokenKind::Minus) {
            self.enter()?;
            let operand = self.unary()?;
            self.leave(1);
            return Ok(match operand {
                Expr::Literal(Value::Number(n)) => match n.as_i64() {
                    Some(i) => match i.checked_neg() {
                        Some(negated) => Expr::Literal(Value::from(negated)),
                        None => Expr::Negate(Box::new(Expr::Literal(Value::Number(n)))),
                    },
                    None => Expr::Literal(float_value(-n.as_f64().unwrap_or_default())),
                },
                other => Expr::Negate(Box::new(other)),
            });
        }

        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.primary()?;
        let mut levels = 0;

        loop {
            if self.check(&TokenKind::Dot) || self.check(&TokenKind::LBracket) {
                self.enter()?;
                levels += 1;
            }
            if self.eat(&TokenKind::Dot) {
                let token = self.advance();
                match token.kind {
                    TokenKind::Name(name) => {
                        expr = Expr::Path(Box::new(expr), name);
                    }
                    other => {
                        return Err(ExpressionError::parse(
                            token.offset,
                            format!("expected a name after '.' but found {}", describe(&other)),
                        ));
                    }
                }
            } else if self.eat(&TokenKind::LBracket) {
                let index = self.expression()?;
                self.expect(TokenKind::RBracket)?;
                expr = Expr::Filter(Box::new(expr), Box::new(index));
            } else {
                self.leave(levels);
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ExpressionError> {
        let token = self.advance();

        match token.kind {
            TokenKind::Number(text) => parse_number_literal(&text, token.offset),
            TokenKind::String(text) => Ok(Expr::Literal(Value::String(text))),
            TokenKind::LParen => {
                let expr = self.expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => self.list(),
            TokenKind::LBrace => self.context(),
            TokenKind::Name(name) => self.name(name, token.offset),
            other => Err(ExpressionError::parse(
                token.offset,
                format!("unexpected {}", describe(&other)),
            )),
        }
    }

    fn name(&mut self, first: String, offset: usize) -> Result<Expr, ExpressionError> {
        match first.as_str() {
            "true" => return Ok(Expr::Literal(Value::Bool(true))),
            "false" => return Ok(Expr::Literal(Value::Bool(false))),
            "null" => return Ok(Expr::Literal(Value::Null)),
            "if" => {
                // `if` nested in an operand position
                self.pos -= 1;
                return self.expression();
            }
            keyword if KEYWORDS.contains(&keyword) => {
                return Err(ExpressionError::parse(
                    offset,
                    format!("unexpected keyword '{}'", keyword),
                ));
            }
            _ => {}
        }

        // Built-in names may span several words, e.g. `upper case(x)`
        if let Some((function, words)) = self.function_name(&first) {
            self.pos += words - 1;
            self.expect(TokenKind::LParen)?;
            let args = self.arguments()?;
            return Ok(Expr::Call(function, args));
        }

        if self.check(&TokenKind::LParen) {
            return Err(ExpressionError::parse(
                offset,
                format!("unknown function '{}'", first),
            ));
        }

        Ok(Expr::Name(first))
    }

    /// Longest built-in function name starting at `first` and followed by `(`
    fn function_name(&self, first: &str) -> Option<(Function, usize)> {
        let mut words = vec![first.to_string()];

        for ahead in 0..Function::max_name_words().saturating_sub(1) {
            match &self.peek_at(ahead).kind {
                TokenKind::Name(word) => words.push(word.clone()),
                _ => break,
            }
        }

        (1..=words.len()).rev().find_map(|count| {
            let function = Function::from_name(&words[..count].join(" "))?;
            (self.peek_at(count - 1).kind == TokenKind::LParen).then_some((function, count))
        })
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ExpressionError> {
        let mut args = Vec::new();

        if self.eat(&TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            args.push(self.expression()?);

            if self.eat(&TokenKind::RParen) {
                return Ok(args);
            }
            self.expect(TokenKind::Comma)?;
        }
    }

    fn list(&mut self) -> Result<Expr, ExpressionError> {
        let mut items = Vec::new();

        if self.eat(&TokenKind::RBracket) {
            return Ok(Expr::List(items));
        }

        loop {
            items.push(self.expression()?);

            if self.eat(&TokenKind::RBracket) {
                return Ok(Expr::List(items));
            }
            self.expect(TokenKind::Comma)?;
        }
    }

    fn context(&mut self) -> Result<Expr, ExpressionError> {
        let mut entries = Vec::new();

        if self.eat(&TokenKind::RBrace) {
            return Ok(Expr::Context(entries));
        }

        loop {
            let token = self.advance();
            let key = match token.kind {
                TokenKind::Name(name) | TokenKind::String(name) => name,
                other => {
                    return Err(ExpressionError::parse(
                        token.offset,
                        format!("expected a context key but found {}", describe(&other)),
                    ));
                }
            };

            self.expect(TokenKind::Colon)?;
            entries.push((key, self.expression()?));

            if self.eat(&TokenKind::RBrace) {
                return Ok(Expr::Context(entries));
            }
            self.expect(TokenKind::Comma)?;
        }
    }
}

fn parse_number_literal(text: &str, offset: usize) -> Result<Expr, ExpressionError> {
    if !text.contains('.') {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Expr::Literal(Value::from(i)));
        }
    }

    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(|n| Expr::Literal(Value::Number(n)))
        .ok_or_else(|| ExpressionError::parse(offset, format!("invalid number '{}'", text)))
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(n) => format!("number '{}'", n),
        TokenKind::String(_) => "string literal".to_string(),
        TokenKind::Name(n) => format!("'{}'", n),
        TokenKind::LParen => "'('".to_string(),
        TokenKind::RParen => "')'".to_string(),
        TokenKind::LBracket => "'['".to_string(),
        TokenKind::RBracket => "']'".to_string(),
        TokenKind::LBrace => "'{'".to_string(),
        TokenKind::RBrace => "'}'".to_string(),
        TokenKind::Comma => "','".to_string(),
        TokenKind::Colon => "':'".to_string(),
        TokenKind::Dot => "'.'".to_string(),
        TokenKind::Plus => "'+'".to_string(),
        TokenKind::Minus => "'-'".to_string(),
        TokenKind::Star => "'*'".to_string(),
        TokenKind::StarStar => "'**'".to_string(),
        TokenKind::Slash => "'/'".to_string(),
        TokenKind::Eq => "'='".to_string(),
        TokenKind::NotEq => "'!='".to_string(),
        TokenKind::Lt => "'<'".to_string(),
        TokenKind::Le => "'<='".to_string(),
        TokenKind::Gt => "'>'".to_string(),
        TokenKind::Ge => "'>='".to_string(),
        TokenKind::Eof => "end of expression".to_string(),
    }
}
