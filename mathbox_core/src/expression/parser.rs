//! Recursive-descent parser producing an operator-precedence AST.
//!
//! Grammar:
//! ```text
//! expression ::= term (('+' | '-') term)*
//! term       ::= unary (('*' | '/') unary)*
//! unary      ::= ('-' | '+') unary | power
//! power      ::= primary ('^' unary)?          // right associative
//! primary    ::= NUMBER | 'x' | 'pi' | 'e'
//!              | FUNCTION '(' expression ')'
//!              | '(' expression ')'
//! ```
//!
//! `^` binds tighter than unary minus, so `-x^2` is `-(x^2)`.

use std::f64::consts::{E, PI};

use serde::{Deserialize, Serialize};

use super::lexer::{Token, TokenKind};
use crate::errors::{CalcError, CalcResult};

/// Binary operators allowed in an equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOperator {
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOperator::Add => a + b,
            BinaryOperator::Subtract => a - b,
            BinaryOperator::Multiply => a * b,
            BinaryOperator::Divide => a / b,
            BinaryOperator::Power => a.powf(b),
        }
    }
}

/// Named unary functions. Trig takes radians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Sqrt,
    Abs,
    /// Base-10 logarithm
    Log,
    /// Natural logarithm
    Ln,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Function::Sin),
            "cos" => Some(Function::Cos),
            "tan" => Some(Function::Tan),
            "sqrt" => Some(Function::Sqrt),
            "abs" => Some(Function::Abs),
            "log" => Some(Function::Log),
            "ln" => Some(Function::Ln),
            _ => None,
        }
    }

    pub fn apply(self, v: f64) -> f64 {
        match self {
            Function::Sin => v.sin(),
            Function::Cos => v.cos(),
            Function::Tan => v.tan(),
            Function::Sqrt => v.sqrt(),
            Function::Abs => v.abs(),
            Function::Log => v.log10(),
            Function::Ln => v.ln(),
        }
    }
}

/// Expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Number(f64),
    Variable,
    Negate(Box<Node>),
    Binary {
        op: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    Call {
        function: Function,
        argument: Box<Node>,
    },
}

impl Node {
    fn binary(op: BinaryOperator, left: Node, right: Node) -> Self {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Evaluate with the variable bound to `x`. Never fails; invalid
    /// arithmetic shows up as NaN or infinity.
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Node::Number(n) => *n,
            Node::Variable => x,
            Node::Negate(inner) => -inner.eval(x),
            Node::Binary { op, left, right } => op.apply(left.eval(x), right.eval(x)),
            Node::Call { function, argument } => function.apply(argument.eval(x)),
        }
    }

    /// Whether the tree references the variable
    pub fn uses_variable(&self) -> bool {
        match self {
            Node::Number(_) => false,
            Node::Variable => true,
            Node::Negate(inner) => inner.uses_variable(),
            Node::Binary { left, right, .. } => left.uses_variable() || right.uses_variable(),
            Node::Call { argument, .. } => argument.uses_variable(),
        }
    }
}

/// Deepest nesting of parentheses, calls, signs and exponents accepted
pub const MAX_DEPTH: usize = 256;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    /// `input_len` is used as the error position for "unexpected end"
    pub fn new(tokens: Vec<Token>, input_len: usize) -> Self {
        Parser {
            tokens,
            pos: 0,
            end: input_len,
            depth: 0,
        }
    }

    /// Parse the whole token stream
    pub fn parse(mut self) -> CalcResult<Node> {
        if self.tokens.is_empty() {
            return Err(CalcError::parse_error(0, "Empty expression"));
        }
        let node = self.expression()?;
        if let Some(token) = self.peek() {
            return Err(CalcError::parse_error(
                token.position,
                format!("Unexpected token {:?}", token.kind),
            ));
        }
        Ok(node)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn next(&mut self) -> CalcResult<Token> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| CalcError::parse_error(self.end, "Unexpected end of expression"))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect_right_paren(&mut self) -> CalcResult<()> {
        let token = self.next()?;
        match token.kind {
            TokenKind::RightParen => Ok(()),
            other => Err(CalcError::parse_error(token.position, format!("Expected ')' but found {:?}", other))),
        }
    }

    fn expression(&mut self) -> CalcResult<Node> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOperator::Add,
                Some(TokenKind::Minus) => BinaryOperator::Subtract,
                _ => break,
            };
            self.pos += 1;
            let right = self.term()?;
            left = Node::binary(op, left, right);
        }
        Ok(left)
    }

    fn term(&mut self) -> CalcResult<Node> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOperator::Multiply,
                Some(TokenKind::Slash) => BinaryOperator::Divide,
                _ => break,
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Node::binary(op, left, right);
        }
        Ok(left)
    }

    /// Every recursive path of the grammar passes through here, so the
    /// depth counter bounds stack use for any input.
    fn unary(&mut self) -> CalcResult<Node> {
        if self.depth >= MAX_DEPTH {
            let position = self.peek().map_or(self.end, |t| t.position);
            return Err(CalcError::parse_error(position, "Expression nested too deeply"));
        }
        self.depth += 1;
        let node = self.signed();
        self.depth -= 1;
        node
    }

    fn signed(&mut self) -> CalcResult<Node> {
        match self.peek_kind() {
            Some(TokenKind::Minus) => {
                self.pos += 1;
                Ok(Node::Negate(Box::new(self.unary()?)))
            }
            Some(TokenKind::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> CalcResult<Node> {
        let base = self.primary()?;
        if matches!(self.peek_kind(), Some(TokenKind::Caret)) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Node::binary(BinaryOperator::Power, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> CalcResult<Node> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Number(n) => Ok(Node::Number(n)),
            TokenKind::LeftParen => {
                let inner = self.expression()?;
                self.expect_right_paren()?;
                Ok(inner)
            }
            TokenKind::Ident(name) => self.identifier(&name, token.position),
            other => Err(CalcError::parse_error(token.position, format!("Unexpected token {:?}", other))),
        }
    }

    fn identifier(&mut self, name: &str, position: usize) -> CalcResult<Node> {
        match name {
            "x" => return Ok(Node::Variable),
            "pi" => return Ok(Node::Number(PI)),
            "e" => return Ok(Node::Number(E)),
            _ => {}
        }

        let function = Function::from_name(name)
            .ok_or_else(|| CalcError::parse_error(position, format!("Unknown identifier '{}'", name)))?;
        match self.next()? {
            Token { kind: TokenKind::LeftParen, .. } => {}
            Token { position, .. } => {
                return Err(CalcError::parse_error(position, format!("Expected '(' after {}", name)));
            }
        }
        let argument = self.expression()?;
        self.expect_right_paren()?;
        Ok(Node::Call {
            function,
            argument: Box::new(argument),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::lexer::tokenize;

    fn parse(input: &str) -> CalcResult<Node> {
        Parser::new(tokenize(input)?, input.chars().count()).parse()
    }

    #[test]
    fn test_precedence() {
        let node = parse("1 + 2 * 3").unwrap();
        assert_eq!(node.eval(0.0), 7.0);
        assert_eq!(parse("(1 + 2) * 3").unwrap().eval(0.0), 9.0);
    }

    #[test]
    fn test_left_associative_subtraction() {
        assert_eq!(parse("10 - 4 - 3").unwrap().eval(0.0), 3.0);
        assert_eq!(parse("12 / 3 / 2").unwrap().eval(0.0), 2.0);
    }

    #[test]
    fn test_power_right_associative() {
        assert_eq!(parse("2^3^2").unwrap().eval(0.0), 512.0);
    }

    #[test]
    fn test_unary_minus_below_power() {
        assert_eq!(parse("-x^2").unwrap().eval(3.0), -9.0);
        assert_eq!(parse("2^-1").unwrap().eval(0.0), 0.5);
        assert_eq!(parse("--x").unwrap().eval(4.0), 4.0);
    }

    #[test]
    fn test_functions_and_constants() {
        assert_eq!(parse("abs(x)").unwrap().eval(-2.5), 2.5);
        assert_eq!(parse("log(100)").unwrap().eval(0.0), 2.0);
        assert!((parse("ln(e)").unwrap().eval(0.0) - 1.0).abs() < 1e-12);
        assert!((parse("cos(pi)").unwrap().eval(0.0) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_uses_variable() {
        assert!(parse("sqrt(x) + 1").unwrap().uses_variable());
        assert!(!parse("sqrt(4) + 1").unwrap().uses_variable());
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse(""), Err(CalcError::ParseError { position: 0, .. })));
        assert!(matches!(parse("2x"), Err(CalcError::ParseError { position: 1, .. })));
        assert!(matches!(parse("(x + 1"), Err(CalcError::ParseError { position: 6, .. })));
        assert!(matches!(parse("foo(x)"), Err(CalcError::ParseError { position: 0, .. })));
        assert!(matches!(parse("sin x"), Err(CalcError::ParseError { position: 4, .. })));
        assert!(parse("x +").is_err());
        assert!(parse("* 2").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let shallow = format!("{}x{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse(&shallow).unwrap().eval(2.0), 2.0);
        let calls = format!("{}x{}", "abs(".repeat(100), ")".repeat(100));
        assert_eq!(parse(&calls).unwrap().eval(-2.0), 2.0);

        let deep = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(matches!(parse(&deep), Err(CalcError::ParseError { .. })));
        let signs = format!("{}x", "-".repeat(100_000));
        assert!(matches!(parse(&signs), Err(CalcError::ParseError { .. })));
        let powers = format!("2{}", "^2".repeat(100_000));
        assert!(matches!(parse(&powers), Err(CalcError::ParseError { .. })));
    }
}
