//! Recursive-descent parser turning a [`crate::lexer::Token`] stream into
//! an [`crate::ast::Query`].
//!
//! The grammar follows the SPARQL 1.1 query forms and expression
//! precedence directly rather than going through a generated grammar: a
//! query is small enough, and the precedence climbing below mirrors the
//! spec's own `Expression` -> `ConditionalOrExpression` -> ... chain one
//! level per method.

use crate::algebra::{OrderKey, PatternTriple, PredicateOrPath, SortDirection, TermOrVar, Variable};
use crate::ast::{GraphPattern, Prologue, Query, QueryForm, SelectVariables, SolutionModifier};
use crate::expr::{ArithOp, BuiltinFn, CompareOp, Expression};
use crate::lexer::{LexError, Lexer, Token};
use crate::path::PropertyPath;
use crate::translate::{translate_pattern, TranslateError};
use rdf_model::{Term, Vocabulary};
use std::collections::HashMap;

/// Errors raised while parsing a query.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The lexer rejected the source text.
    #[error(transparent)]
    Lex(#[from] LexError),
    /// The parser needed something it didn't find.
    #[error("parse error at token {index}: expected {expected}, found {found}")]
    Unexpected {
        /// Index into the token stream.
        index: usize,
        /// What the parser was looking for.
        expected: String,
        /// The token actually seen.
        found: String,
    },
    /// A prefixed name used an undeclared prefix.
    #[error("undeclared prefix '{0}'")]
    UndeclaredPrefix(String),
    /// An `EXISTS`/`NOT EXISTS` subpattern failed to lower to algebra.
    #[error(transparent)]
    Translate(#[from] TranslateError),
    /// A numeric literal's lexical form didn't parse.
    #[error("invalid numeric literal '{0}'")]
    InvalidNumber(String),
}

/// Parse a full query from source text.
pub fn parse(source: &str) -> Result<Query, ParseError> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse_query()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    prefixes: HashMap<String, String>,
    base: Option<String>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            prefixes: HashMap::new(),
            base: None,
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn error(&self, expected: impl Into<String>) -> ParseError {
        ParseError::Unexpected {
            index: self.pos,
            expected: expected.into(),
            found: format!("{}", self.peek()),
        }
    }

    fn is_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Token::Keyword(k) if k.eq_ignore_ascii_case(word))
    }

    fn eat_keyword(&mut self, word: &str) -> Result<(), ParseError> {
        if self.is_keyword(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("keyword {word}")))
        }
    }

    fn try_eat_keyword(&mut self, word: &str) -> bool {
        if self.is_keyword(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat(&mut self, expected: &Token) -> Result<(), ParseError> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("{expected}")))
        }
    }

    fn try_eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    // ---- Prologue ----

    fn parse_query(&mut self) -> Result<Query, ParseError> {
        self.parse_prologue()?;
        let form_keyword = self.peek().clone();
        let query = if self.is_keyword("SELECT") {
            self.parse_select()?
        } else if self.is_keyword("CONSTRUCT") {
            self.parse_construct()?
        } else if self.is_keyword("ASK") {
            self.parse_ask()?
        } else if self.is_keyword("DESCRIBE") {
            self.parse_describe()?
        } else {
            return Err(self.error_at_token("SELECT/CONSTRUCT/ASK/DESCRIBE", form_keyword));
        };
        Ok(query)
    }

    fn error_at_token(&self, expected: &str, found: Token) -> ParseError {
        ParseError::Unexpected {
            index: self.pos,
            expected: expected.to_string(),
            found: format!("{found}"),
        }
    }

    fn parse_prologue(&mut self) -> Result<(), ParseError> {
        loop {
            if self.try_eat_keyword("BASE") {
                let Token::IriRef(iri) = self.advance() else {
                    return Err(self.error("an IRI reference"));
                };
                self.base = Some(iri);
            } else if self.try_eat_keyword("PREFIX") {
                let prefix = match self.advance() {
                    Token::PrefixedName(p, local) if local.is_empty() => p,
                    other => return Err(self.error_at_token("a prefix name followed by ':'", other)),
                };
                let Token::IriRef(iri) = self.advance() else {
                    return Err(self.error("an IRI reference"));
                };
                self.prefixes.insert(prefix, iri);
            } else {
                break;
            }
        }
        Ok(())
    }

    fn resolve_iri(&self, iri: String) -> String {
        match &self.base {
            Some(base) if !iri.contains("://") => format!("{base}{iri}"),
            _ => iri,
        }
    }

    fn resolve_prefixed(&self, prefix: &str, local: &str) -> Result<String, ParseError> {
        let ns = self
            .prefixes
            .get(prefix)
            .ok_or_else(|| ParseError::UndeclaredPrefix(prefix.to_string()))?;
        Ok(format!("{ns}{local}"))
    }

    // ---- Query forms ----

    fn parse_select(&mut self) -> Result<Query, ParseError> {
        self.eat_keyword("SELECT")?;
        let distinct = self.try_eat_keyword("DISTINCT");
        self.try_eat_keyword("REDUCED");
        let variables = if self.try_eat(&Token::Star) {
            SelectVariables::All
        } else {
            let mut vars = Vec::new();
            while let Token::Variable(_) = self.peek() {
                vars.push(self.parse_variable()?);
            }
            if vars.is_empty() {
                return Err(self.error("a projected variable or '*'"));
            }
            SelectVariables::Named(vars)
        };
        self.skip_dataset_clauses();
        self.eat_keyword("WHERE")?;
        let where_clause = self.parse_group_graph_pattern()?;
        let modifiers = self.parse_solution_modifier()?;
        Ok(Query {
            prologue: self.prologue(),
            form: QueryForm::Select { variables, distinct },
            where_clause,
            modifiers,
        })
    }

    fn parse_construct(&mut self) -> Result<Query, ParseError> {
        self.eat_keyword("CONSTRUCT")?;
        self.eat(&Token::LBrace)?;
        let template = self.parse_triples_block()?;
        self.eat(&Token::RBrace)?;
        self.skip_dataset_clauses();
        self.eat_keyword("WHERE")?;
        let where_clause = self.parse_group_graph_pattern()?;
        let modifiers = self.parse_solution_modifier()?;
        Ok(Query {
            prologue: self.prologue(),
            form: QueryForm::Construct { template },
            where_clause,
            modifiers,
        })
    }

    fn parse_ask(&mut self) -> Result<Query, ParseError> {
        self.eat_keyword("ASK")?;
        self.skip_dataset_clauses();
        self.eat_keyword("WHERE")?;
        let where_clause = self.parse_group_graph_pattern()?;
        Ok(Query {
            prologue: self.prologue(),
            form: QueryForm::Ask,
            where_clause,
            modifiers: SolutionModifier::default(),
        })
    }

    fn parse_describe(&mut self) -> Result<Query, ParseError> {
        self.eat_keyword("DESCRIBE")?;
        let resources = if self.try_eat(&Token::Star) {
            Vec::new()
        } else {
            let mut out = Vec::new();
            loop {
                out.push(self.parse_var_or_term()?);
                if !matches!(self.peek(), Token::Variable(_) | Token::IriRef(_) | Token::PrefixedName(_, _)) {
                    break;
                }
            }
            out
        };
        self.skip_dataset_clauses();
        let where_clause = if self.try_eat_keyword("WHERE") {
            self.parse_group_graph_pattern()?
        } else {
            GraphPattern::Empty
        };
        let modifiers = self.parse_solution_modifier()?;
        Ok(Query {
            prologue: self.prologue(),
            form: QueryForm::Describe { resources },
            where_clause,
            modifiers,
        })
    }

    fn prologue(&self) -> Prologue {
        Prologue {
            base: self.base.clone(),
            prefixes: self.prefixes.clone(),
        }
    }

    /// `FROM`/`FROM NAMED` clauses are accepted and discarded: this engine
    /// has exactly one graph (the vault's default graph), so a dataset
    /// clause names nothing it doesn't already query.
    fn skip_dataset_clauses(&mut self) {
        while self.is_keyword("FROM") {
            self.advance();
            self.try_eat_keyword("NAMED");
            self.advance();
        }
    }

    // ---- Solution modifiers ----

    fn parse_solution_modifier(&mut self) -> Result<SolutionModifier, ParseError> {
        let mut modifier = SolutionModifier::default();
        if self.try_eat_keyword("ORDER") {
            self.eat_keyword("BY")?;
            modifier.order_by = self.parse_order_conditions()?;
        }
        loop {
            if self.try_eat_keyword("LIMIT") {
                modifier.limit = Some(self.parse_integer()?);
            } else if self.try_eat_keyword("OFFSET") {
                modifier.offset = Some(self.parse_integer()?);
            } else {
                break;
            }
        }
        Ok(modifier)
    }

    fn parse_order_conditions(&mut self) -> Result<Vec<OrderKey>, ParseError> {
        let mut keys = Vec::new();
        loop {
            let direction = if self.try_eat_keyword("ASC") {
                SortDirection::Ascending
            } else if self.try_eat_keyword("DESC") {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            let expr = if matches!(self.peek(), Token::LParen) {
                self.eat(&Token::LParen)?;
                let e = self.parse_expression()?;
                self.eat(&Token::RParen)?;
                e
            } else if let Token::Variable(_) = self.peek() {
                Expression::Var(self.parse_variable()?)
            } else {
                break;
            };
            keys.push(OrderKey { expr, direction });
            if !matches!(self.peek(), Token::Variable(_) | Token::LParen) && !self.is_keyword("ASC") && !self.is_keyword("DESC") {
                break;
            }
        }
        if keys.is_empty() {
            return Err(self.error("at least one ORDER BY condition"));
        }
        Ok(keys)
    }

    fn parse_integer(&mut self) -> Result<usize, ParseError> {
        match self.advance() {
            Token::Numeric(s) => s.parse().map_err(|_| ParseError::InvalidNumber(s)),
            other => Err(self.error_at_token("an integer", other)),
        }
    }

    // ---- Graph patterns ----

    fn parse_group_graph_pattern(&mut self) -> Result<GraphPattern, ParseError> {
        self.eat(&Token::LBrace)?;
        let pattern = self.parse_group_graph_pattern_body()?;
        self.eat(&Token::RBrace)?;
        Ok(pattern)
    }

    fn parse_group_graph_pattern_body(&mut self) -> Result<GraphPattern, ParseError> {
        let mut pattern = GraphPattern::Empty;
        let mut have_pattern = false;

        loop {
            if matches!(self.peek(), Token::RBrace) {
                break;
            }

            if self.is_keyword("OPTIONAL") {
                self.advance();
                let inner = self.parse_group_graph_pattern()?;
                pattern = GraphPattern::Optional(Box::new(pattern), Box::new(inner));
                have_pattern = true;
            } else if self.is_keyword("FILTER") {
                self.advance();
                let expr = self.parse_constraint()?;
                pattern = GraphPattern::Filter(expr, Box::new(pattern));
            } else if self.is_keyword("BIND") {
                self.advance();
                self.eat(&Token::LParen)?;
                let expr = self.parse_expression()?;
                self.eat_keyword("AS")?;
                let var = self.parse_variable()?;
                self.eat(&Token::RParen)?;
                pattern = GraphPattern::Bind(expr, var, Box::new(pattern));
                have_pattern = true;
            } else if self.is_keyword("SERVICE") {
                self.advance();
                let endpoint = self.parse_var_or_term()?;
                let inner = self.parse_group_graph_pattern()?;
                let service = GraphPattern::Service {
                    endpoint,
                    pattern: Box::new(inner),
                };
                pattern = if have_pattern {
                    GraphPattern::Join(Box::new(pattern), Box::new(service))
                } else {
                    service
                };
                have_pattern = true;
            } else if matches!(self.peek(), Token::LBrace) {
                let mut group = self.parse_group_graph_pattern()?;
                if self.try_eat_keyword("UNION") {
                    loop {
                        let next = self.parse_group_graph_pattern()?;
                        group = GraphPattern::Union(Box::new(group), Box::new(next));
                        if !self.try_eat_keyword("UNION") {
                            break;
                        }
                    }
                }
                pattern = if have_pattern {
                    GraphPattern::Join(Box::new(pattern), Box::new(group))
                } else {
                    group
                };
                have_pattern = true;
            } else {
                let triples = self.parse_triples_block()?;
                if !triples.is_empty() {
                    let bgp = GraphPattern::Bgp(triples);
                    pattern = if have_pattern {
                        GraphPattern::Join(Box::new(pattern), Box::new(bgp))
                    } else {
                        bgp
                    };
                    have_pattern = true;
                }
            }

            self.try_eat(&Token::Dot);
        }

        Ok(pattern)
    }

    /// A block of `TriplesBlock`: `subject predicate object (';' predicate
    /// object)* (',' object)*` groups, separated by `.`, up to the closing
    /// `}`. Property paths in the predicate position fold into
    /// [`PredicateOrPath::Path`] instead of flattening to a single `Bgp`
    /// triple.
    fn parse_triples_block(&mut self) -> Result<Vec<PatternTriple>, ParseError> {
        let mut triples = Vec::new();
        loop {
            if matches!(self.peek(), Token::RBrace) || self.at_pattern_keyword() {
                break;
            }
            self.parse_triples_same_subject(&mut triples)?;
            if !self.try_eat(&Token::Dot) {
                break;
            }
        }
        Ok(triples)
    }

    fn at_pattern_keyword(&self) -> bool {
        ["OPTIONAL", "FILTER", "BIND", "SERVICE"].iter().any(|k| self.is_keyword(k))
    }

    fn parse_triples_same_subject(&mut self, out: &mut Vec<PatternTriple>) -> Result<(), ParseError> {
        let subject = self.parse_var_or_term()?;
        loop {
            let predicate = self.parse_predicate()?;
            loop {
                let object = self.parse_var_or_term()?;
                out.push(PatternTriple {
                    subject: subject.clone(),
                    predicate: predicate.clone(),
                    object,
                });
                if !self.try_eat(&Token::Comma) {
                    break;
                }
            }
            if !self.try_eat(&Token::Semicolon) {
                break;
            }
            if matches!(self.peek(), Token::Dot | Token::RBrace) {
                break;
            }
        }
        Ok(())
    }

    fn parse_predicate(&mut self) -> Result<PredicateOrPath, ParseError> {
        if self.is_keyword("A") {
            self.advance();
            return Ok(PredicateOrPath::Predicate(TermOrVar::Term(Term::iri(Vocabulary::RDF_TYPE))));
        }
        if let Token::Variable(name) = self.peek().clone() {
            self.advance();
            return Ok(PredicateOrPath::Predicate(TermOrVar::Var(Variable::new(name))));
        }
        let path = self.parse_path_alternative()?;
        Ok(match path {
            PropertyPath::Predicate(iri) if !matches!(self.peek(), Token::Slash | Token::Pipe) => {
                PredicateOrPath::Predicate(TermOrVar::Term(iri))
            }
            other => PredicateOrPath::Path(other),
        })
    }

    // ---- Property paths (and the TermOrVar positions around them) ----

    fn parse_path_alternative(&mut self) -> Result<PropertyPath, ParseError> {
        let mut path = self.parse_path_sequence()?;
        while self.try_eat(&Token::Pipe) {
            let rhs = self.parse_path_sequence()?;
            path = PropertyPath::Alternative(Box::new(path), Box::new(rhs));
        }
        Ok(path)
    }

    fn parse_path_sequence(&mut self) -> Result<PropertyPath, ParseError> {
        let mut path = self.parse_path_postfix()?;
        while self.try_eat(&Token::Slash) {
            let rhs = self.parse_path_postfix()?;
            path = PropertyPath::Sequence(Box::new(path), Box::new(rhs));
        }
        Ok(path)
    }

    fn parse_path_postfix(&mut self) -> Result<PropertyPath, ParseError> {
        let mut path = self.parse_path_primary()?;
        loop {
            if self.try_eat(&Token::Star) {
                path = PropertyPath::ZeroOrMore(Box::new(path));
            } else if self.try_eat(&Token::Plus) {
                path = PropertyPath::OneOrMore(Box::new(path));
            } else if self.try_eat(&Token::Question) {
                path = PropertyPath::ZeroOrOne(Box::new(path));
            } else {
                break;
            }
        }
        Ok(path)
    }

    fn parse_path_primary(&mut self) -> Result<PropertyPath, ParseError> {
        if self.try_eat(&Token::Caret) {
            let inner = self.parse_path_primary()?;
            return Ok(PropertyPath::Inverse(Box::new(inner)));
        }
        if self.try_eat(&Token::Bang) {
            self.eat(&Token::LParen)?;
            let mut excluded = Vec::new();
            loop {
                excluded.push(self.parse_iri_only()?);
                if !self.try_eat(&Token::Pipe) {
                    break;
                }
            }
            self.eat(&Token::RParen)?;
            return Ok(PropertyPath::NegatedPropertySet(excluded));
        }
        if self.try_eat(&Token::LParen) {
            let inner = self.parse_path_alternative()?;
            self.eat(&Token::RParen)?;
            return Ok(inner);
        }
        if self.is_keyword("A") {
            self.advance();
            return Ok(PropertyPath::Predicate(Term::iri(Vocabulary::RDF_TYPE)));
        }
        Ok(PropertyPath::Predicate(self.parse_iri_only()?))
    }

    fn parse_iri_only(&mut self) -> Result<Term, ParseError> {
        match self.parse_var_or_term()? {
            TermOrVar::Term(t) if t.is_iri() => Ok(t),
            _ => Err(self.error("an IRI")),
        }
    }

    // ---- Terms ----

    fn parse_variable(&mut self) -> Result<Variable, ParseError> {
        match self.advance() {
            Token::Variable(name) => Ok(Variable::new(name)),
            other => Err(self.error_at_token("a variable", other)),
        }
    }

    fn parse_var_or_term(&mut self) -> Result<TermOrVar, ParseError> {
        match self.peek().clone() {
            Token::Variable(name) => {
                self.advance();
                Ok(TermOrVar::Var(Variable::new(name)))
            }
            Token::IriRef(iri) => {
                self.advance();
                Ok(TermOrVar::Term(Term::iri(self.resolve_iri(iri))))
            }
            Token::PrefixedName(prefix, local) => {
                self.advance();
                Ok(TermOrVar::Term(Term::iri(self.resolve_prefixed(&prefix, &local)?)))
            }
            Token::BlankNodeLabel(label) => {
                self.advance();
                Ok(TermOrVar::Term(Term::blank_node(label)))
            }
            Token::StringLiteral(_) | Token::Numeric(_) | Token::BooleanLiteral(_) => {
                Ok(TermOrVar::Term(self.parse_literal()?))
            }
            other => Err(self.error_at_token("a term or variable", other)),
        }
    }

    fn parse_literal(&mut self) -> Result<Term, ParseError> {
        match self.advance() {
            Token::StringLiteral(value) => {
                if let Token::LangTag(tag) = self.peek().clone() {
                    self.advance();
                    Ok(Term::lang_literal(value, tag))
                } else if self.try_eat(&Token::CaretCaret) {
                    let datatype = self.parse_iri_only()?;
                    let Term::Iri(iri) = datatype else { unreachable!() };
                    Ok(Term::typed_literal(value, iri.as_str().to_string()))
                } else {
                    Ok(Term::plain_literal(value))
                }
            }
            Token::Numeric(s) => {
                let datatype = if s.contains('.') || s.contains(['e', 'E']) {
                    Vocabulary::XSD_DECIMAL
                } else {
                    Vocabulary::XSD_INTEGER
                };
                Ok(Term::typed_literal(s, datatype))
            }
            Token::BooleanLiteral(b) => Ok(Term::typed_literal(b.to_string(), Vocabulary::XSD_BOOLEAN)),
            other => Err(self.error_at_token("a literal", other)),
        }
    }

    // ---- Expressions (precedence climbing) ----

    fn parse_constraint(&mut self) -> Result<Expression, ParseError> {
        if matches!(self.peek(), Token::LParen) {
            self.eat(&Token::LParen)?;
            let expr = self.parse_expression()?;
            self.eat(&Token::RParen)?;
            Ok(expr)
        } else {
            self.parse_unary_expression()
        }
    }

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_or_expression()
    }

    fn parse_or_expression(&mut self) -> Result<Expression, ParseError> {
        let mut lhs = self.parse_and_expression()?;
        while self.try_eat(&Token::OrOr) {
            let rhs = self.parse_and_expression()?;
            lhs = Expression::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and_expression(&mut self) -> Result<Expression, ParseError> {
        let mut lhs = self.parse_comparison_expression()?;
        while self.try_eat(&Token::AndAnd) {
            let rhs = self.parse_comparison_expression()?;
            lhs = Expression::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_comparison_expression(&mut self) -> Result<Expression, ParseError> {
        let lhs = self.parse_additive_expression()?;
        let op = match self.peek() {
            Token::Equals => CompareOp::Eq,
            Token::NotEquals => CompareOp::Ne,
            Token::LessThan => CompareOp::Lt,
            Token::LessEquals => CompareOp::Le,
            Token::GreaterThan => CompareOp::Gt,
            Token::GreaterEquals => CompareOp::Ge,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_additive_expression()?;
        Ok(Expression::Compare(op, Box::new(lhs), Box::new(rhs)))
    }

    fn parse_additive_expression(&mut self) -> Result<Expression, ParseError> {
        let mut lhs = self.parse_multiplicative_expression()?;
        loop {
            let op = match self.peek() {
                Token::Plus => ArithOp::Add,
                Token::Minus => ArithOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative_expression()?;
            lhs = Expression::Arithmetic(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative_expression(&mut self) -> Result<Expression, ParseError> {
        let mut lhs = self.parse_unary_expression()?;
        loop {
            let op = match self.peek() {
                Token::Star => ArithOp::Mul,
                Token::Slash => ArithOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary_expression()?;
            lhs = Expression::Arithmetic(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, ParseError> {
        if self.try_eat(&Token::Bang) {
            return Ok(Expression::Not(Box::new(self.parse_unary_expression()?)));
        }
        if self.try_eat(&Token::Minus) {
            return Ok(Expression::Negate(Box::new(self.parse_unary_expression()?)));
        }
        self.try_eat(&Token::Plus);
        self.parse_primary_expression()
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, ParseError> {
        if self.is_keyword("NOT") {
            self.advance();
            self.eat_keyword("EXISTS")?;
            let pattern = self.parse_group_graph_pattern()?;
            return Ok(Expression::Exists {
                negate: true,
                pattern: Box::new(translate_pattern(&pattern)?),
            });
        }
        if self.is_keyword("EXISTS") {
            self.advance();
            let pattern = self.parse_group_graph_pattern()?;
            return Ok(Expression::Exists {
                negate: false,
                pattern: Box::new(translate_pattern(&pattern)?),
            });
        }
        if self.is_keyword("IF") {
            self.advance();
            self.eat(&Token::LParen)?;
            let cond = self.parse_expression()?;
            self.eat(&Token::Comma)?;
            let then = self.parse_expression()?;
            self.eat(&Token::Comma)?;
            let els = self.parse_expression()?;
            self.eat(&Token::RParen)?;
            return Ok(Expression::If(Box::new(cond), Box::new(then), Box::new(els)));
        }
        if self.is_keyword("BOUND") {
            self.advance();
            self.eat(&Token::LParen)?;
            let var = self.parse_variable()?;
            self.eat(&Token::RParen)?;
            return Ok(Expression::Bound(var));
        }
        if let Some(builtin) = self.peek_builtin() {
            return self.parse_builtin_call(builtin);
        }
        if matches!(self.peek(), Token::LParen) {
            self.advance();
            let expr = self.parse_expression()?;
            self.eat(&Token::RParen)?;
            return Ok(expr);
        }
        match self.peek().clone() {
            Token::Variable(name) => {
                self.advance();
                Ok(Expression::Var(Variable::new(name)))
            }
            Token::StringLiteral(_) | Token::Numeric(_) | Token::BooleanLiteral(_) => {
                Ok(Expression::Literal(self.parse_literal()?))
            }
            Token::IriRef(_) | Token::PrefixedName(_, _) => {
                let TermOrVar::Term(t) = self.parse_var_or_term()? else {
                    unreachable!("IriRef/PrefixedName tokens always resolve to a Term")
                };
                Ok(Expression::Literal(t))
            }
            other => Err(self.error_at_token("an expression", other)),
        }
    }

    fn peek_builtin(&self) -> Option<BuiltinFn> {
        let Token::Keyword(name) = self.peek() else {
            return None;
        };
        match name.as_str() {
            "STR" => Some(BuiltinFn::Str),
            "UCASE" => Some(BuiltinFn::Ucase),
            "LCASE" => Some(BuiltinFn::Lcase),
            "STRLEN" => Some(BuiltinFn::StrLen),
            "CONTAINS" => Some(BuiltinFn::Contains),
            "REGEX" => Some(BuiltinFn::Regex),
            "ISIRI" => Some(BuiltinFn::IsIri),
            "ISLITERAL" => Some(BuiltinFn::IsLiteral),
            _ => None,
        }
    }

    fn parse_builtin_call(&mut self, f: BuiltinFn) -> Result<Expression, ParseError> {
        self.advance();
        self.eat(&Token::LParen)?;
        let mut args = Vec::new();
        if !matches!(self.peek(), Token::RParen) {
            args.push(self.parse_expression()?);
            while self.try_eat(&Token::Comma) {
                args.push(self.parse_expression()?);
            }
        }
        self.eat(&Token::RParen)?;
        Ok(Expression::Call(f, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::Algebra;
    use crate::translate::translate;

    #[test]
    fn parses_simple_select() {
        let query = parse("SELECT ?x WHERE { ?x <http://ex/knows> ?y }").unwrap();
        match query.form {
            QueryForm::Select { variables: SelectVariables::Named(v), distinct } => {
                assert_eq!(v.len(), 1);
                assert!(!distinct);
            }
            other => panic!("expected Select, got {other:?}"),
        }
    }

    #[test]
    fn parses_select_distinct_star() {
        let query = parse("SELECT DISTINCT * WHERE { ?x ?p ?o }").unwrap();
        match query.form {
            QueryForm::Select { variables: SelectVariables::All, distinct } => assert!(distinct),
            other => panic!("expected Select *, got {other:?}"),
        }
    }

    #[test]
    fn parses_prefixed_names_with_declared_prefix() {
        let query = parse("PREFIX ex: <http://example.org/> SELECT ?x WHERE { ?x ex:knows ex:bob }").unwrap();
        let GraphPattern::Bgp(triples) = query.where_clause else {
            panic!("expected a single Bgp");
        };
        assert_eq!(triples.len(), 1);
        match &triples[0].object {
            TermOrVar::Term(Term::Iri(iri)) => assert_eq!(iri.as_str(), "http://example.org/bob"),
            other => panic!("expected an Iri, got {other:?}"),
        }
    }

    #[test]
    fn rejects_undeclared_prefix() {
        let err = parse("SELECT ?x WHERE { ?x ex:knows ?y }").unwrap_err();
        assert!(matches!(err, ParseError::UndeclaredPrefix(p) if p == "ex"));
    }

    #[test]
    fn parses_optional_and_filter() {
        let query = parse(
            "SELECT ?x ?age WHERE { ?x <http://ex/knows> ?y . OPTIONAL { ?x <http://ex/age> ?age } FILTER(?age > 18) }",
        )
        .unwrap();
        assert!(matches!(query.where_clause, GraphPattern::Filter(_, _)));
    }

    #[test]
    fn parses_property_path_with_sequence_and_star() {
        let query = parse("SELECT ?x WHERE { ?x (<http://ex/sub>)* <http://ex/type> }").unwrap();
        match query.where_clause {
            GraphPattern::Bgp(triples) => {
                assert!(matches!(triples[0].predicate, PredicateOrPath::Path(PropertyPath::ZeroOrMore(_))));
            }
            GraphPattern::Path { path, .. } => assert!(matches!(path, PropertyPath::ZeroOrMore(_))),
            other => panic!("expected a path pattern, got {other:?}"),
        }
    }

    #[test]
    fn parses_blank_node_label_as_a_blank_node_term() {
        let query = parse("SELECT ?x WHERE { _:b1 <http://ex/knows> ?x }").unwrap();
        let GraphPattern::Bgp(triples) = query.where_clause else {
            panic!("expected a single Bgp");
        };
        match &triples[0].subject {
            TermOrVar::Term(Term::BlankNode(b)) => assert_eq!(b.0.as_ref(), "b1"),
            other => panic!("expected a BlankNode, got {other:?}"),
        }
    }

    #[test]
    fn parses_not_exists_filter() {
        let query = parse(
            "SELECT ?x WHERE { ?x <http://ex/knows> ?y . FILTER NOT EXISTS { ?y <http://ex/age> ?a } }",
        )
        .unwrap();
        let translated = translate(&query).unwrap();
        fn has_exists(algebra: &Algebra) -> bool {
            match algebra {
                Algebra::Filter(expr, inner) => matches!(expr, Expression::Exists { negate: true, .. }) || has_exists(inner),
                Algebra::Project(inner, _) | Algebra::Distinct(inner) | Algebra::OrderBy(inner, _) => has_exists(inner),
                Algebra::Join(a, b) | Algebra::Union(a, b) => has_exists(a) || has_exists(b),
                _ => false,
            }
        }
        assert!(has_exists(&translated.algebra));
    }

    #[test]
    fn parses_order_by_limit_offset() {
        let query = parse("SELECT ?x WHERE { ?x ?p ?o } ORDER BY DESC(?x) LIMIT 10 OFFSET 5").unwrap();
        assert_eq!(query.modifiers.limit, Some(10));
        assert_eq!(query.modifiers.offset, Some(5));
        assert_eq!(query.modifiers.order_by.len(), 1);
        assert_eq!(query.modifiers.order_by[0].direction, SortDirection::Descending);
    }

    #[test]
    fn parses_ask_query() {
        let query = parse("ASK WHERE { ?x <http://ex/knows> ?y }").unwrap();
        assert!(matches!(query.form, QueryForm::Ask));
    }

    #[test]
    fn parses_construct_template() {
        let query = parse(
            "CONSTRUCT { ?x <http://ex/name> ?n } WHERE { ?x <http://ex/label> ?n }",
        )
        .unwrap();
        match query.form {
            QueryForm::Construct { template } => assert_eq!(template.len(), 1),
            other => panic!("expected Construct, got {other:?}"),
        }
    }
}
