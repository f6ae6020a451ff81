use crate::ast::{tokenize, ASTNode, Constant, Function, Operator, SpannedToken, Token};
use crate::error::{Error, ParseError};
use log::debug;

static END: Token = Token::End;

/// Nesting budget shared by parentheses, call arguments, unary minus,
/// exponents and each link of an operator chain. Keeps both the parser and
/// the tree walk off the end of the stack.
pub const MAX_DEPTH: usize = 256;

/// Recursive-descent parser over a token sequence.
///
/// Grammar, loosest binding first:
///
/// ```text
/// expression := term (('+' | '-') term)*
/// term       := unary (('*' | '/') unary | power)*     // bare `power` is implicit multiplication
/// unary      := '-' unary | power
/// power      := primary ('^' unary)?                    // right-associative
/// primary    := number | identifier | identifier '(' args ')' | '(' expression ')'
/// ```
///
/// Implicit multiplication shares the precedence of `*` and `/` and is
/// left-associative, so `1/2x` is `(1/2)*x`. Its right operand must start
/// with an identifier or `(`. Unary minus binds looser than `^`, so `-2^2`
/// is `-(2^2)`.
///
/// Input nested deeper than [`MAX_DEPTH`] fails with
/// [`ParseError::TooDeep`]. A chain such as `1+1+1` counts one level per
/// operator, since it builds a tree as deep as it is long.
pub struct Parser<'t> {
    tokens: &'t [SpannedToken],
    cursor: usize,
    depth: usize,
}

/// Builds an AST from `tokens`.
pub fn parse(tokens: &[SpannedToken]) -> Result<ASTNode, ParseError> {
    Parser::new(tokens).parse()
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [SpannedToken]) -> Self {
        Self {
            tokens,
            cursor: 0,
            depth: 0,
        }
    }

    /// Tokenizes and parses `input` in one step.
    pub fn parse_expression(input: &str) -> Result<ASTNode, Error> {
        debug!("Parsing expression: {}", input);
        let tokens = tokenize(input)?;
        let ast = parse(&tokens)?;
        debug!("Parse result: {}", ast);
        Ok(ast)
    }

    pub fn parse(mut self) -> Result<ASTNode, ParseError> {
        if matches!(self.peek(), Token::End) {
            return Err(ParseError::EmptyExpression);
        }
        check_balance(self.tokens)?;

        let ast = self.expression()?;
        match self.peek() {
            Token::End => Ok(ast),
            _ => Err(self.unexpected("an operator or end of input")),
        }
    }

    fn peek(&self) -> &'t Token {
        self.tokens
            .get(self.cursor)
            .map(|spanned| &spanned.token)
            .unwrap_or(&END)
    }

    fn peek_next(&self) -> &'t Token {
        self.tokens
            .get(self.cursor + 1)
            .map(|spanned| &spanned.token)
            .unwrap_or(&END)
    }

    fn position(&self) -> usize {
        match self.tokens.get(self.cursor) {
            Some(spanned) => spanned.position,
            None => self
                .tokens
                .last()
                .map_or(0, |spanned| spanned.position + 1),
        }
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }

    fn expect(&mut self, token: &Token, expected: &'static str) -> Result<(), ParseError> {
        if self.peek() == token {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::TooDeep { limit: MAX_DEPTH });
        }
        Ok(())
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        ParseError::UnexpectedToken {
            position: self.position(),
            found: self.peek().clone(),
            expected,
        }
    }

    fn expression(&mut self) -> Result<ASTNode, ParseError> {
        let entry = self.depth;
        let mut node = self.term()?;

        loop {
            let operator = match self.peek() {
                Token::Operator(operator @ (Operator::Add | Operator::Subtract)) => *operator,
                _ => break,
            };
            self.advance();
            self.descend()?;
            let right = self.term()?;
            node = ASTNode::binary(node, operator, right);
        }

        self.depth = entry;
        Ok(node)
    }

    fn term(&mut self) -> Result<ASTNode, ParseError> {
        let entry = self.depth;
        let mut node = self.unary()?;

        loop {
            match self.peek() {
                Token::Operator(operator @ (Operator::Multiply | Operator::Divide)) => {
                    let operator = *operator;
                    self.advance();
                    self.descend()?;
                    let right = self.unary()?;
                    node = ASTNode::binary(node, operator, right);
                }
                Token::Identifier(_) | Token::LeftParen => {
                    debug!("Implicit multiplication at position {}", self.position());
                    self.descend()?;
                    let right = self.power()?;
                    node = ASTNode::binary(node, Operator::Multiply, right);
                }
                _ => break,
            }
        }

        self.depth = entry;
        Ok(node)
    }

    fn unary(&mut self) -> Result<ASTNode, ParseError> {
        if matches!(self.peek(), Token::Operator(Operator::Subtract)) {
            self.advance();
            self.descend()?;
            let operand = self.unary()?;
            self.depth -= 1;
            return Ok(ASTNode::negate(operand));
        }
        self.power()
    }

    fn power(&mut self) -> Result<ASTNode, ParseError> {
        let base = self.primary()?;
        if matches!(self.peek(), Token::Operator(Operator::Power)) {
            self.advance();
            // The exponent may itself be negated or raised: 2^-1, 2^3^2.
            self.descend()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            return Ok(ASTNode::binary(base, Operator::Power, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<ASTNode, ParseError> {
        match self.peek() {
            Token::Number(value) => {
                self.advance();
                Ok(ASTNode::Literal(*value))
            }
            Token::Identifier(name) => {
                // Function names are reserved: `sin x` wants a '(' after `sin`.
                if let Ok(function) = Function::try_from(name.as_str()) {
                    self.advance();
                    return self.function_call(function);
                }
                // `x(x+1)` and `pi(2)` multiply; any longer name is a
                // misspelled or unsupported function.
                if matches!(self.peek_next(), Token::LeftParen)
                    && Constant::try_from(name.as_str()).is_err()
                    && name.chars().count() > 1
                {
                    return Err(ParseError::UnknownFunction(name.clone()));
                }
                self.advance();
                Ok(match Constant::try_from(name.as_str()) {
                    Ok(constant) => ASTNode::Constant(constant),
                    Err(_) => ASTNode::Variable(name.clone()),
                })
            }
            Token::LeftParen => {
                self.advance();
                self.descend()?;
                let inner = self.expression()?;
                self.depth -= 1;
                self.expect(&Token::RightParen, "')'")?;
                Ok(inner)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn function_call(&mut self, function: Function) -> Result<ASTNode, ParseError> {
        self.expect(&Token::LeftParen, "'('")?;

        self.descend()?;
        let mut arguments = Vec::new();
        if !matches!(self.peek(), Token::RightParen) {
            arguments.push(self.expression()?);
            while matches!(self.peek(), Token::Comma) {
                self.advance();
                arguments.push(self.expression()?);
            }
        }
        self.depth -= 1;
        self.expect(&Token::RightParen, "')'")?;

        if arguments.len() != function.arity() {
            return Err(ParseError::ArityMismatch {
                function: function.name().to_string(),
                expected: function.arity(),
                found: arguments.len(),
            });
        }
        let argument = arguments.remove(0);
        Ok(ASTNode::call(function, argument))
    }
}

/// Rejects sequences whose parentheses do not pair up before any
/// structural parsing happens.
fn check_balance(tokens: &[SpannedToken]) -> Result<(), ParseError> {
    let mut depth = 0usize;
    for spanned in tokens {
        match spanned.token {
            Token::LeftParen => depth += 1,
            Token::RightParen => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(ParseError::UnbalancedParens)?;
            }
            _ => {}
        }
    }
    if depth == 0 {
        Ok(())
    } else {
        Err(ParseError::UnbalancedParens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::UnaryOperator;

    fn parse_str(input: &str) -> Result<ASTNode, ParseError> {
        let tokens = tokenize(input).unwrap();
        parse(&tokens)
    }

    fn shape(input: &str) -> String {
        parse_str(input).unwrap().to_string()
    }

    fn var(name: &str) -> ASTNode {
        ASTNode::Variable(name.to_string())
    }

    #[test]
    fn test_simple_binary_expression() {
        let ast = parse_str("x + 100").unwrap();
        let expected_ast = ASTNode::BinaryOperation {
            left: Box::new(var("x")),
            operator: Operator::Add,
            right: Box::new(ASTNode::Literal(100.0)),
        };
        assert_eq!(ast, expected_ast);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(shape("2+3*4"), "(2 + (3 * 4))");
        assert_eq!(shape("(2+3)*4"), "((2 + 3) * 4)");
        assert_eq!(shape("2-3-4"), "((2 - 3) - 4)");
        assert_eq!(shape("8/4/2"), "((8 / 4) / 2)");
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(shape("2^3^2"), "(2 ^ (3 ^ 2))");
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        assert_eq!(shape("-2^2"), "(-(2 ^ 2))");
        assert_eq!(shape("2^-1"), "(2 ^ (-1))");
        assert_eq!(shape("--x"), "(-(-x))");
        assert_eq!(shape("3*-x"), "(3 * (-x))");
        assert_eq!(shape("2-(-3)"), "(2 - (-3))");
    }

    #[test]
    fn test_unary_minus_binds_tighter_than_addition() {
        let ast = parse_str("-x+1").unwrap();
        let expected_ast = ASTNode::binary(
            ASTNode::UnaryOperation {
                operator: UnaryOperator::Negate,
                operand: Box::new(var("x")),
            },
            Operator::Add,
            ASTNode::Literal(1.0),
        );
        assert_eq!(ast, expected_ast);
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(shape("2x"), "(2 * x)");
        assert_eq!(shape("2(3+1)"), "(2 * (3 + 1))");
        assert_eq!(shape("x(x+1)"), "(x * (x + 1))");
        assert_eq!(shape("(x+1)(x-1)"), "((x + 1) * (x - 1))");
        assert_eq!(shape("2π"), "(2 * pi)");
        assert_eq!(shape("2pi x"), "((2 * pi) * x)");
        assert_eq!(shape("3sin(x)"), "(3 * sin(x))");
        assert_eq!(shape("2x^2"), "(2 * (x ^ 2))");
        assert_eq!(shape("-2x"), "((-2) * x)");
    }

    #[test]
    fn test_implicit_multiplication_shares_division_precedence() {
        // (1/2)*x, not 1/(2x)
        assert_eq!(shape("1/2x"), "((1 / 2) * x)");
        assert_eq!(shape("6/2(1+2)"), "((6 / 2) * (1 + 2))");
        assert_eq!(shape("x/2y"), "((x / 2) * y)");
    }

    #[test]
    fn test_implicit_multiplication_needs_identifier_or_paren() {
        assert!(matches!(
            parse_str("x2"),
            Err(ParseError::UnexpectedToken {
                position: 1,
                found: Token::Number(_),
                ..
            })
        ));
        assert!(matches!(
            parse_str("2 3"),
            Err(ParseError::UnexpectedToken { position: 2, .. })
        ));
        assert!(matches!(
            parse_str("(x+1)2"),
            Err(ParseError::UnexpectedToken { position: 5, .. })
        ));
    }

    #[test]
    fn test_identifiers_resolve_statically() {
        assert_eq!(
            parse_str("e").unwrap(),
            ASTNode::Constant(Constant::E)
        );
        assert_eq!(
            parse_str("pi").unwrap(),
            ASTNode::Constant(Constant::Pi)
        );
        assert_eq!(parse_str("y").unwrap(), var("y"));
        assert_eq!(
            parse_str("sqrt(x)").unwrap(),
            ASTNode::call(Function::Sqrt, var("x"))
        );
        assert_eq!(shape("pi(2)"), "(pi * 2)");
    }

    #[test]
    fn test_function_name_needs_parenthesis() {
        assert_eq!(
            parse_str("sin x"),
            Err(ParseError::UnexpectedToken {
                position: 4,
                found: Token::Identifier("x".to_string()),
                expected: "'('",
            })
        );
        assert_eq!(
            parse_str("2 + sqrt"),
            Err(ParseError::UnexpectedToken {
                position: 8,
                found: Token::End,
                expected: "'('",
            })
        );
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let input = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(
            parse_str(&input),
            Err(ParseError::TooDeep { limit: MAX_DEPTH })
        );

        let input = format!("{}x", "-".repeat(10_000));
        assert_eq!(
            parse_str(&input),
            Err(ParseError::TooDeep { limit: MAX_DEPTH })
        );

        let input = format!("{}1)", "sqrt(".repeat(5_000));
        let input = format!("{}{}", input, ")".repeat(4_999));
        assert_eq!(
            parse_str(&input),
            Err(ParseError::TooDeep { limit: MAX_DEPTH })
        );
    }

    #[test]
    fn test_long_operator_chains_are_rejected() {
        let input = format!("{}1", "1+".repeat(100_000));
        assert_eq!(
            parse_str(&input),
            Err(ParseError::TooDeep { limit: MAX_DEPTH })
        );

        let input = format!("{}2", "2^".repeat(10_000));
        assert_eq!(
            parse_str(&input),
            Err(ParseError::TooDeep { limit: MAX_DEPTH })
        );

        let input = format!("{}x", "x*".repeat(10_000));
        assert_eq!(
            parse_str(&input),
            Err(ParseError::TooDeep { limit: MAX_DEPTH })
        );
    }

    #[test]
    fn test_depth_within_limit_parses() {
        let input = format!("{}x{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse_str(&input).unwrap(), var("x"));

        let input = format!("{}1", "1+".repeat(200));
        assert!(parse_str(&input).is_ok());

        // Sibling groups do not add up.
        let group = format!("({})", "1+".repeat(150) + "1");
        let input = vec![group; 50].join("*");
        assert!(parse_str(&input).is_ok());
    }

    #[test]
    fn test_nested_function_calls() {
        assert_eq!(shape("sin(sqrt(x^2 + y^2))"), "sin(sqrt(((x ^ 2) + (y ^ 2))))");
        assert_eq!(shape("exp(-x)log(x)"), "(exp((-x)) * log(x))");
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(
            parse_str("foo(2)"),
            Err(ParseError::UnknownFunction("foo".to_string()))
        );
        assert_eq!(
            parse_str("1 + ln(x)"),
            Err(ParseError::UnknownFunction("ln".to_string()))
        );
    }

    #[test]
    fn test_arity_mismatch() {
        assert_eq!(
            parse_str("sin()"),
            Err(ParseError::ArityMismatch {
                function: "sin".to_string(),
                expected: 1,
                found: 0,
            })
        );
        assert_eq!(
            parse_str("log(x, 10)"),
            Err(ParseError::ArityMismatch {
                function: "log".to_string(),
                expected: 1,
                found: 2,
            })
        );
    }

    #[test]
    fn test_unbalanced_parens() {
        assert_eq!(parse_str("(3 + (4 * 2)"), Err(ParseError::UnbalancedParens));
        assert_eq!(parse_str("3 + 4)"), Err(ParseError::UnbalancedParens));
        assert_eq!(parse_str(")("), Err(ParseError::UnbalancedParens));
        assert_eq!(parse_str("sin(x"), Err(ParseError::UnbalancedParens));
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(parse_str(""), Err(ParseError::EmptyExpression));
        assert_eq!(parse_str("   "), Err(ParseError::EmptyExpression));
        assert_eq!(parse(&[]), Err(ParseError::EmptyExpression));
    }

    #[test]
    fn test_unexpected_tokens() {
        assert_eq!(
            parse_str("3 + * 5"),
            Err(ParseError::UnexpectedToken {
                position: 4,
                found: Token::Operator(Operator::Multiply),
                expected: "an expression",
            })
        );
        assert_eq!(
            parse_str("x +"),
            Err(ParseError::UnexpectedToken {
                position: 3,
                found: Token::End,
                expected: "an expression",
            })
        );
        assert_eq!(
            parse_str("()"),
            Err(ParseError::UnexpectedToken {
                position: 1,
                found: Token::RightParen,
                expected: "an expression",
            })
        );
        assert_eq!(
            parse_str("1, 2"),
            Err(ParseError::UnexpectedToken {
                position: 1,
                found: Token::Comma,
                expected: "an operator or end of input",
            })
        );
        assert_eq!(
            parse_str("(1, 2)"),
            Err(ParseError::UnexpectedToken {
                position: 2,
                found: Token::Comma,
                expected: "')'",
            })
        );
        // Unary plus is not part of the grammar.
        assert!(matches!(
            parse_str("+1"),
            Err(ParseError::UnexpectedToken { position: 0, .. })
        ));
    }

    #[test]
    fn test_parse_expression_reports_lex_errors() {
        assert!(matches!(
            Parser::parse_expression("2 # 3"),
            Err(Error::Lex(_))
        ));
        assert!(matches!(
            Parser::parse_expression("2 +"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_excess_whitespace() {
        let input = "   (   x   +  10  )   *   (  y  -  5  )   ";
        assert_eq!(shape(input), "((x + 10) * (y - 5))");
    }
}
