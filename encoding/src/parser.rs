//! `TypeParser`: recursive-descent parsing of a [`crate::lexer::Token`]
//! stream into a [`TypeDescriptor`].

use chfx_core::error::{ParseErrorSnafu, UnknownTypeSnafu};
use chfx_core::{IntWidth, PrimitiveType, Result, TypeDescriptor};

use crate::lexer::{tokenize, Token};

/// Parses a full type descriptor string, e.g.
/// `"Array(Nullable(Tuple(id UInt32, name String)))"`.
///
/// Fails with `ParseError` on any unexpected token, unknown type name, or
/// trailing tokens after a complete expression (spec §4.2).
pub fn parse_type(src: &str) -> Result<TypeDescriptor> {
    let tokens = tokenize(src)?;
    let mut parser = Parser { tokens: &tokens };
    let ty = parser.parse_type_expr()?;
    if !parser.tokens.is_empty() {
        let (tok, pos) = &parser.tokens[0];
        return ParseErrorSnafu {
            position: *pos,
            message: format!("trailing tokens after type expression, starting at {tok:?}"),
        }
        .fail();
    }
    Ok(ty)
}

struct Parser<'a> {
    /// Remaining tokens; consumed from the front as parsing progresses.
    tokens: &'a [(Token, usize)],
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&(Token, usize)> {
        self.tokens.first()
    }

    fn bump(&mut self) -> Option<(Token, usize)> {
        let (first, rest) = self.tokens.split_first()?;
        self.tokens = rest;
        Some(first.clone())
    }

    fn eof_pos(&self) -> usize {
        self.tokens.last().map(|(_, p)| p + 1).unwrap_or(0)
    }

    fn expect_token(&mut self, expected: &Token) -> Result<usize> {
        match self.bump() {
            Some((tok, pos)) if &tok == expected => Ok(pos),
            Some((tok, pos)) => ParseErrorSnafu {
                position: pos,
                message: format!("expected {expected:?}, found {tok:?}"),
            }
            .fail(),
            None => ParseErrorSnafu {
                position: self.eof_pos(),
                message: format!("expected {expected:?}, found end of input"),
            }
            .fail(),
        }
    }

    fn expect_identifier(&mut self) -> Result<(String, usize)> {
        match self.bump() {
            Some((Token::Identifier(name), pos)) => Ok((name, pos)),
            Some((tok, pos)) => ParseErrorSnafu {
                position: pos,
                message: format!("expected identifier, found {tok:?}"),
            }
            .fail(),
            None => ParseErrorSnafu {
                position: self.eof_pos(),
                message: "expected identifier, found end of input".to_string(),
            }
            .fail(),
        }
    }

    fn expect_number(&mut self) -> Result<(i64, usize)> {
        match self.bump() {
            Some((Token::Number(n), pos)) => Ok((n, pos)),
            Some((tok, pos)) => ParseErrorSnafu {
                position: pos,
                message: format!("expected number, found {tok:?}"),
            }
            .fail(),
            None => ParseErrorSnafu {
                position: self.eof_pos(),
                message: "expected number, found end of input".to_string(),
            }
            .fail(),
        }
    }

    fn expect_string(&mut self) -> Result<(String, usize)> {
        match self.bump() {
            Some((Token::Str(s), pos)) => Ok((s, pos)),
            Some((tok, pos)) => ParseErrorSnafu {
                position: pos,
                message: format!("expected string literal, found {tok:?}"),
            }
            .fail(),
            None => ParseErrorSnafu {
                position: self.eof_pos(),
                message: "expected string literal, found end of input".to_string(),
            }
            .fail(),
        }
    }

    fn at_rparen(&self) -> bool {
        matches!(self.peek(), Some((Token::RParen, _)))
    }

    /// `NUMBER` tokens carry an `i64`; wire-level lengths/precisions are
    /// never negative, so this converts and rejects negative literals.
    fn non_negative(n: i64, pos: usize, what: &str) -> Result<u64> {
        if n < 0 {
            ParseErrorSnafu {
                position: pos,
                message: format!("{what} must not be negative, got {n}"),
            }
            .fail()
        } else {
            Ok(n as u64)
        }
    }

    /// `TypeExpr := IDENTIFIER [ "(" Params ")" ]`
    fn parse_type_expr(&mut self) -> Result<TypeDescriptor> {
        let (name, pos) = self.expect_identifier()?;
        self.parse_type_expr_continuation(name, pos)
    }

    /// Finishes parsing a `TypeExpr` given its already-consumed leading
    /// identifier. Split out from [`Parser::parse_type_expr`] so that
    /// `Tuple`'s ambiguous `(IDENTIFIER TypeExpr) | TypeExpr` elements can
    /// look one token ahead before deciding whether the first identifier
    /// was a field name or the type's own constructor name.
    fn parse_type_expr_continuation(&mut self, name: String, pos: usize) -> Result<TypeDescriptor> {
        if matches!(self.peek(), Some((Token::LParen, _))) {
            self.bump();
            let ty = self.parse_constructor(&name, pos)?;
            self.expect_token(&Token::RParen)?;
            Ok(ty)
        } else {
            match name.as_str() {
                "Dynamic" => Ok(TypeDescriptor::Dynamic { max_types: None }),
                "JSON" => Ok(TypeDescriptor::Json {
                    typed_paths: Vec::new(),
                    max_dynamic_paths: None,
                }),
                _ => PrimitiveType::by_name(&name)
                    .map(TypeDescriptor::Primitive)
                    .ok_or_else(|| UnknownTypeSnafu { name: name.clone() }.build()),
            }
        }
    }

    fn parse_constructor(&mut self, name: &str, name_pos: usize) -> Result<TypeDescriptor> {
        match name {
            "Array" => Ok(TypeDescriptor::Array {
                element: Box::new(self.parse_type_expr()?),
            }),
            "Nullable" => Ok(TypeDescriptor::Nullable {
                inner: Box::new(self.parse_type_expr()?),
            }),
            "LowCardinality" => Ok(TypeDescriptor::LowCardinality {
                inner: Box::new(self.parse_type_expr()?),
            }),
            "Map" => {
                let key = self.parse_type_expr()?;
                self.expect_token(&Token::Comma)?;
                let value = self.parse_type_expr()?;
                Ok(TypeDescriptor::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            "FixedString" => {
                let (n, pos) = self.expect_number()?;
                let length = Self::non_negative(n, pos, "FixedString length")?;
                Ok(TypeDescriptor::FixedString { length })
            }
            "Decimal32" | "Decimal64" | "Decimal128" | "Decimal256" => {
                let width = match name {
                    "Decimal32" => IntWidth::W32,
                    "Decimal64" => IntWidth::W64,
                    "Decimal128" => IntWidth::W128,
                    _ => IntWidth::W256,
                };
                let (first, first_pos) = self.expect_number()?;
                if matches!(self.peek(), Some((Token::Comma, _))) {
                    self.bump();
                    let (second, second_pos) = self.expect_number()?;
                    let precision = Self::non_negative(first, first_pos, "Decimal precision")? as u32;
                    let scale = Self::non_negative(second, second_pos, "Decimal scale")? as u32;
                    Ok(TypeDescriptor::decimal_for_width(width, Some(precision), scale))
                } else {
                    let scale = Self::non_negative(first, first_pos, "Decimal scale")? as u32;
                    Ok(TypeDescriptor::decimal_for_width(width, None, scale))
                }
            }
            "Decimal" => {
                let (p, p_pos) = self.expect_number()?;
                self.expect_token(&Token::Comma)?;
                let (s, s_pos) = self.expect_number()?;
                let precision = Self::non_negative(p, p_pos, "Decimal precision")? as u32;
                let scale = Self::non_negative(s, s_pos, "Decimal scale")? as u32;
                Ok(TypeDescriptor::decimal_from_precision_scale(precision, scale))
            }
            "DateTime" => {
                if self.at_rparen() {
                    Ok(TypeDescriptor::DateTime { timezone: None })
                } else {
                    let (tz, _) = self.expect_string()?;
                    Ok(TypeDescriptor::DateTime { timezone: Some(tz) })
                }
            }
            "DateTime64" => {
                let (p, p_pos) = self.expect_number()?;
                let precision = Self::non_negative(p, p_pos, "DateTime64 precision")? as u8;
                let timezone = if matches!(self.peek(), Some((Token::Comma, _))) {
                    self.bump();
                    Some(self.expect_string()?.0)
                } else {
                    None
                };
                Ok(TypeDescriptor::DateTime64 { precision, timezone })
            }
            "Time64" => {
                let (p, p_pos) = self.expect_number()?;
                let precision = Self::non_negative(p, p_pos, "Time64 precision")? as u8;
                Ok(TypeDescriptor::Time64 { precision })
            }
            "Enum8" | "Enum16" => {
                let width = if name == "Enum8" {
                    IntWidth::W8
                } else {
                    IntWidth::W16
                };
                let mut values = Vec::new();
                loop {
                    let (label, _) = self.expect_string()?;
                    self.expect_token(&Token::Equals)?;
                    let (code, _) = self.expect_number()?;
                    values.push((code as i32, label));
                    if matches!(self.peek(), Some((Token::Comma, _))) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                Ok(TypeDescriptor::Enum { width, values })
            }
            "Variant" => {
                let mut variants = vec![self.parse_type_expr()?];
                while matches!(self.peek(), Some((Token::Comma, _))) {
                    self.bump();
                    variants.push(self.parse_type_expr()?);
                }
                TypeDescriptor::normalize_variant_order(&mut variants);
                Ok(TypeDescriptor::Variant { variants })
            }
            "Dynamic" => Ok(TypeDescriptor::Dynamic {
                max_types: self.parse_dynamic_params()?,
            }),
            "JSON" => {
                let (typed_paths, max_dynamic_paths) = self.parse_json_params()?;
                Ok(TypeDescriptor::Json {
                    typed_paths,
                    max_dynamic_paths,
                })
            }
            "Tuple" => {
                let mut elements = Vec::new();
                let mut names = Vec::new();
                let mut any_named = false;
                loop {
                    let (name, ty) = self.parse_tuple_element()?;
                    any_named |= name.is_some();
                    names.push(name.unwrap_or_default());
                    elements.push(ty);
                    if matches!(self.peek(), Some((Token::Comma, _))) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                Ok(TypeDescriptor::Tuple {
                    elements,
                    names: any_named.then_some(names),
                })
            }
            "Nested" => {
                let mut fields = Vec::new();
                loop {
                    let (field_name, _) = self.expect_identifier()?;
                    let ty = self.parse_type_expr()?;
                    fields.push((field_name, ty));
                    if matches!(self.peek(), Some((Token::Comma, _))) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                Ok(TypeDescriptor::Nested { fields })
            }
            "QBit" => {
                let element = self.parse_type_expr()?;
                self.expect_token(&Token::Comma)?;
                let (dim, dim_pos) = self.expect_number()?;
                let dimension = Self::non_negative(dim, dim_pos, "QBit dimension")?;
                Ok(TypeDescriptor::QBit {
                    element: Box::new(element),
                    dimension,
                })
            }
            "AggregateFunction" => {
                let (function_name, _) = self.expect_identifier()?;
                let mut arg_types = Vec::new();
                while matches!(self.peek(), Some((Token::Comma, _))) {
                    self.bump();
                    arg_types.push(self.parse_type_expr()?);
                }
                Ok(TypeDescriptor::AggregateFunction {
                    function_name,
                    arg_types,
                })
            }
            other => ParseErrorSnafu {
                position: name_pos,
                message: format!("`{other}` does not take parameters"),
            }
            .fail(),
        }
    }

    /// A `Tuple` element is either `TypeExpr` or `IDENTIFIER TypeExpr`; the
    /// two are disambiguated by looking one token past the first
    /// identifier: a second identifier means the first was a field name.
    fn parse_tuple_element(&mut self) -> Result<(Option<String>, TypeDescriptor)> {
        let (first, first_pos) = self.expect_identifier()?;
        if matches!(self.peek(), Some((Token::Identifier(_), _))) {
            let (second, second_pos) = self.expect_identifier()?;
            let ty = self.parse_type_expr_continuation(second, second_pos)?;
            Ok((Some(first), ty))
        } else {
            let ty = self.parse_type_expr_continuation(first, first_pos)?;
            Ok((None, ty))
        }
    }

    fn parse_dynamic_params(&mut self) -> Result<Option<u64>> {
        if self.at_rparen() {
            return Ok(None);
        }
        match self.bump() {
            Some((Token::Number(n), pos)) => Ok(Some(Self::non_negative(n, pos, "Dynamic max_types")?)),
            Some((Token::Identifier(id), pos)) if id == "max_types" => {
                self.expect_token(&Token::Equals)?;
                let (n, n_pos) = self.expect_number()?;
                Ok(Some(Self::non_negative(n, n_pos, "Dynamic max_types")?))
            }
            Some((tok, pos)) => ParseErrorSnafu {
                position: pos,
                message: format!("unexpected token in Dynamic(...): {tok:?}"),
            }
            .fail(),
            None => ParseErrorSnafu {
                position: self.eof_pos(),
                message: "unexpected end of input in Dynamic(...)".to_string(),
            }
            .fail(),
        }
    }

    /// `JSON`'s parameter list: each entry is either a recognized (or
    /// silently-skipped, forward-compatible) `key = NUMBER`, or a typed
    /// path `path TypeExpr`.
    fn parse_json_params(&mut self) -> Result<(Vec<(String, TypeDescriptor)>, Option<u64>)> {
        let mut typed_paths = Vec::new();
        let mut max_dynamic_paths = None;
        if self.at_rparen() {
            return Ok((typed_paths, max_dynamic_paths));
        }
        loop {
            let (ident, ident_pos) = self.expect_identifier()?;
            if matches!(self.peek(), Some((Token::Equals, _))) {
                self.bump();
                let (n, n_pos) = self.expect_number()?;
                if ident == "max_dynamic_paths" {
                    max_dynamic_paths = Some(Self::non_negative(n, n_pos, "max_dynamic_paths")?);
                }
                // Any other `key = NUMBER` parameter is forward-compatible
                // and intentionally ignored once its tokens are consumed.
            } else {
                let ty = self.parse_type_expr()?;
                let _ = ident_pos;
                typed_paths.push((ident, ty));
            }
            if matches!(self.peek(), Some((Token::Comma, _))) {
                self.bump();
            } else {
                break;
            }
        }
        Ok((typed_paths, max_dynamic_paths))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chfx_core::IntervalUnit;

    #[test]
    fn parses_primitive() {
        assert_eq!(
            parse_type("UInt32").unwrap(),
            TypeDescriptor::Primitive(PrimitiveType::UInt(IntWidth::W32))
        );
    }

    #[test]
    fn parses_interval() {
        assert_eq!(
            parse_type("IntervalDay").unwrap(),
            TypeDescriptor::Primitive(PrimitiveType::Interval(IntervalUnit::Day))
        );
    }

    #[test]
    fn unknown_type_fails() {
        let err = parse_type("Flibbertigibbet").unwrap_err();
        assert!(matches!(err, chfx_core::Error::UnknownType { .. }));
    }

    #[test]
    fn parses_array_of_nullable_tuple() {
        let ty = parse_type("Array(Nullable(Tuple(id UInt32, name String)))").unwrap();
        match ty {
            TypeDescriptor::Array { element } => match *element {
                TypeDescriptor::Nullable { inner } => match *inner {
                    TypeDescriptor::Tuple { elements, names } => {
                        assert_eq!(elements.len(), 2);
                        assert_eq!(names.unwrap(), vec!["id".to_string(), "name".to_string()]);
                    }
                    other => panic!("expected Tuple, got {other:?}"),
                },
                other => panic!("expected Nullable, got {other:?}"),
            },
            other => panic!("expected Array, got {other:?}"),
        }
    }

    #[test]
    fn parses_unnamed_tuple_with_nested_constructor_element() {
        let ty = parse_type("Tuple(UInt8, Array(String))").unwrap();
        match ty {
            TypeDescriptor::Tuple { elements, names } => {
                assert!(names.is_none());
                assert_eq!(elements.len(), 2);
            }
            other => panic!("expected Tuple, got {other:?}"),
        }
    }

    #[test]
    fn decimal_two_numbers_is_precision_then_scale() {
        let ty = parse_type("Decimal32(5, 2)").unwrap();
        assert_eq!(
            ty,
            TypeDescriptor::Decimal {
                width: IntWidth::W32,
                precision: 5,
                scale: 2,
            }
        );
    }

    #[test]
    fn generic_decimal_maps_to_narrowest_width() {
        let ty = parse_type("Decimal(20, 4)").unwrap();
        assert_eq!(ty.canonical_name(), "Decimal128");
    }

    #[test]
    fn enum8_parses_ordered_values() {
        let ty = parse_type("Enum8('a' = 1, 'b' = 2)").unwrap();
        assert_eq!(
            ty,
            TypeDescriptor::Enum {
                width: IntWidth::W8,
                values: vec![(1, "a".into()), (2, "b".into())],
            }
        );
    }

    #[test]
    fn variant_order_is_independent_of_source_order() {
        let a = parse_type("Variant(String, UInt64)").unwrap();
        let b = parse_type("Variant(UInt64, String)").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn dynamic_with_bare_number() {
        let ty = parse_type("Dynamic(16)").unwrap();
        assert_eq!(ty, TypeDescriptor::Dynamic { max_types: Some(16) });
    }

    #[test]
    fn dynamic_with_named_param() {
        let ty = parse_type("Dynamic(max_types=32)").unwrap();
        assert_eq!(ty, TypeDescriptor::Dynamic { max_types: Some(32) });
    }

    #[test]
    fn json_with_typed_path_and_max_dynamic_paths() {
        let ty = parse_type("JSON(max_dynamic_paths=10, `a.b` Int32)").unwrap();
        match ty {
            TypeDescriptor::Json {
                typed_paths,
                max_dynamic_paths,
            } => {
                assert_eq!(max_dynamic_paths, Some(10));
                assert_eq!(typed_paths.len(), 1);
                assert_eq!(typed_paths[0].0, "a.b");
            }
            other => panic!("expected JSON, got {other:?}"),
        }
    }

    #[test]
    fn json_dotted_path_via_backtick() {
        let ty = parse_type("JSON(`a.b` Int32)").unwrap();
        match ty {
            TypeDescriptor::Json { typed_paths, .. } => {
                assert_eq!(typed_paths[0].0, "a.b");
            }
            other => panic!("expected JSON, got {other:?}"),
        }
    }

    #[test]
    fn aggregate_function_parses_name_and_args() {
        let ty = parse_type("AggregateFunction(avg, UInt64)").unwrap();
        assert_eq!(
            ty,
            TypeDescriptor::AggregateFunction {
                function_name: "avg".into(),
                arg_types: vec![TypeDescriptor::Primitive(PrimitiveType::UInt(IntWidth::W64))],
            }
        );
    }

    #[test]
    fn trailing_tokens_are_a_parse_error() {
        let err = parse_type("UInt8 UInt8").unwrap_err();
        assert!(matches!(err, chfx_core::Error::ParseError { .. }));
    }
}
