//! Typed override tag parameters and the token codec
//!
//! Each slot of a [`TagPrototype`](crate::prototype::TagPrototype) turns one
//! raw argument token into an [`OverrideParameter`]. Decoding never fails:
//! numbers follow C `atoi`/`atof` prefix rules (no numeric prefix decodes to
//! zero) and anything left unconsumed is reported as a
//! [`DiagnosticKind::MalformedNumber`]. Such a parameter keeps its source
//! token and serializes it unchanged until one of the setters replaces the
//! value, so `\be1.5` survives a parse/serialize pass.
//!
//! # Scripting placeholders
//!
//! Tokens starting with `!`, `$` or `%` are expressions evaluated later by
//! an automation layer. They are kept verbatim as [`ParameterValue::Text`]
//! whatever the declared type, except for block slots which always parse
//! their contents as tags.
//!
//! # Example
//!
//! ```rust
//! use ass_override::{OverrideTag, ParameterValue};
//!
//! let tag = OverrideTag::parse("\\bord2.5");
//! assert_eq!(tag.params()[0].value(), Some(&ParameterValue::Float(2.5)));
//!
//! let tag = OverrideTag::parse("\\bord$width");
//! assert_eq!(tag.params()[0].as_text().unwrap(), "$width");
//! ```

use std::borrow::Cow;

use crate::{
    block::OverrideBlock,
    color::Color,
    diagnostics::{DiagnosticKind, DiagnosticSink},
    errors::{OverrideError, Result},
    prototype::{ParamClass, ParamPrototype, ParamType},
};

/// Decoded value of a parameter
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterValue {
    /// Integer argument
    Int(i32),
    /// Floating point argument
    Float(f64),
    /// Verbatim text, including scripting placeholders
    Text(String),
    /// Boolean argument
    Bool(bool),
    /// Nested tags, as carried by `\t`
    Block(OverrideBlock),
}

impl ParameterValue {
    /// Zero value of the given type
    #[must_use]
    pub fn zero(ty: ParamType) -> Self {
        match ty {
            ParamType::Int => Self::Int(0),
            ParamType::Float => Self::Float(0.0),
            ParamType::Text => Self::Text(String::new()),
            ParamType::Bool => Self::Bool(false),
            ParamType::Block => Self::Block(OverrideBlock::default()),
        }
    }

    /// Type of the stored value
    #[must_use]
    pub const fn ty(&self) -> ParamType {
        match self {
            Self::Int(_) => ParamType::Int,
            Self::Float(_) => ParamType::Float,
            Self::Text(_) => ParamType::Text,
            Self::Bool(_) => ParamType::Bool,
            Self::Block(_) => ParamType::Block,
        }
    }

    /// Serialized argument text
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Float(v) => float_to_string(*v),
            Self::Text(s) => s.clone(),
            Self::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Self::Block(block) => block.interior(),
        }
    }
}

/// One parameter of an [`OverrideTag`](crate::OverrideTag)
///
/// Omitted parameters keep the zero value of their declared type and are
/// skipped on serialization and by
/// [`process_parameters`](crate::process_parameters).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverrideParameter {
    value: ParameterValue,
    ty: ParamType,
    class: ParamClass,
    omitted: bool,
    /// Token the number codec only partly consumed
    source: Option<String>,
}

impl OverrideParameter {
    /// Present parameter holding `value`
    #[must_use]
    pub fn new(value: ParameterValue, class: ParamClass) -> Self {
        Self {
            ty: value.ty(),
            value,
            class,
            omitted: false,
            source: None,
        }
    }

    /// Absent parameter for a prototype slot
    #[must_use]
    pub fn omitted(proto: &ParamPrototype) -> Self {
        Self {
            value: ParameterValue::zero(proto.ty),
            ty: proto.ty,
            class: proto.class,
            omitted: true,
            source: None,
        }
    }

    /// Declared type of the prototype slot
    #[must_use]
    pub const fn ty(&self) -> ParamType {
        self.ty
    }

    /// Semantic role of the parameter
    #[must_use]
    pub const fn class(&self) -> ParamClass {
        self.class
    }

    /// Whether the argument was absent from the source
    #[must_use]
    pub const fn is_omitted(&self) -> bool {
        self.omitted
    }

    /// Stored value, `None` when omitted
    #[must_use]
    pub const fn value(&self) -> Option<&ParameterValue> {
        if self.omitted {
            None
        } else {
            Some(&self.value)
        }
    }

    /// Serialized argument text, empty when omitted
    ///
    /// A number that was decoded from a malformed token is written back as
    /// that token.
    #[must_use]
    pub fn encode(&self) -> String {
        if self.omitted {
            String::new()
        } else if let Some(source) = &self.source {
            source.clone()
        } else {
            self.value.encode()
        }
    }

    /// Source token kept for a malformed number, if any
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn present(&self) -> Result<&ParameterValue> {
        if self.omitted {
            Err(OverrideError::OmittedParameter)
        } else {
            Ok(&self.value)
        }
    }

    fn mismatch(&self, expected: ParamType) -> OverrideError {
        OverrideError::TypeMismatch {
            expected,
            found: self.value.ty(),
        }
    }

    /// Integer view of the parameter
    ///
    /// Alpha parameters decode the hex digits of `&H<aa>&`, clamped to
    /// `0..=255`. Text and floats truncate like C `atoi`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is omitted or holds a block.
    pub fn as_int(&self) -> Result<i32> {
        match self.present()? {
            ParameterValue::Text(s) if self.class == ParamClass::Alpha => Ok(parse_alpha(s)),
            ParameterValue::Int(v) => Ok(*v),
            #[allow(clippy::cast_possible_truncation)]
            ParameterValue::Float(v) => Ok(*v as i32),
            ParameterValue::Bool(b) => Ok(i32::from(*b)),
            ParameterValue::Text(s) => Ok(parse_int_prefix(s).0),
            ParameterValue::Block(_) => Err(self.mismatch(ParamType::Int)),
        }
    }

    /// Floating point view of the parameter
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is omitted or holds a block.
    pub fn as_float(&self) -> Result<f64> {
        match self.present()? {
            ParameterValue::Int(v) => Ok(f64::from(*v)),
            ParameterValue::Float(v) => Ok(*v),
            ParameterValue::Bool(b) => Ok(f64::from(u8::from(*b))),
            ParameterValue::Text(s) => Ok(parse_float_prefix(s).0),
            ParameterValue::Block(_) => Err(self.mismatch(ParamType::Float)),
        }
    }

    /// Boolean view: any non-zero integer is true
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is omitted or holds a block.
    pub fn as_bool(&self) -> Result<bool> {
        self.as_int().map(|v| v != 0)
    }

    /// Text view; numbers and blocks are rendered in serialized form
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is omitted.
    pub fn as_text(&self) -> Result<Cow<'_, str>> {
        match self.present()? {
            ParameterValue::Text(s) => Ok(Cow::Borrowed(s.as_str())),
            other => Ok(self
                .source
                .as_deref()
                .map_or_else(|| Cow::Owned(other.encode()), Cow::Borrowed)),
        }
    }

    /// Colour view of a text parameter; unparseable text yields black
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is omitted or not text.
    pub fn as_color(&self) -> Result<Color> {
        match self.present()? {
            ParameterValue::Text(s) => Ok(Color::parse(s).unwrap_or_default()),
            _ => Err(self.mismatch(ParamType::Text)),
        }
    }

    /// Nested block of a `\t` style parameter
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is omitted or not a block.
    pub fn as_block(&self) -> Result<&OverrideBlock> {
        match self.present()? {
            ParameterValue::Block(block) => Ok(block),
            _ => Err(self.mismatch(ParamType::Block)),
        }
    }

    /// Mutable nested block
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is omitted or not a block.
    pub fn as_block_mut(&mut self) -> Result<&mut OverrideBlock> {
        if self.omitted {
            return Err(OverrideError::OmittedParameter);
        }
        let found = self.value.ty();
        match &mut self.value {
            ParameterValue::Block(block) => Ok(block),
            _ => Err(OverrideError::TypeMismatch {
                expected: ParamType::Block,
                found,
            }),
        }
    }

    fn set(&mut self, value: ParameterValue) {
        self.value = value;
        self.omitted = false;
        self.source = None;
    }

    /// Store an integer; alpha parameters are written as `&H<aa>&`
    pub fn set_int(&mut self, value: i32) {
        if self.class == ParamClass::Alpha {
            self.set(ParameterValue::Text(format!("&H{:02X}&", value.clamp(0, 255))));
        } else {
            self.set(ParameterValue::Int(value));
        }
    }

    /// Store a float
    pub fn set_float(&mut self, value: f64) {
        self.set(ParameterValue::Float(value));
    }

    /// Store a boolean
    pub fn set_bool(&mut self, value: bool) {
        self.set(ParameterValue::Bool(value));
    }

    /// Store verbatim text
    pub fn set_text(&mut self, value: impl Into<String>) {
        self.set(ParameterValue::Text(value.into()));
    }

    /// Store a colour as `&HBBGGRR&`
    pub fn set_color(&mut self, color: Color) {
        self.set(ParameterValue::Text(color.to_ass()));
    }

    /// Store a nested block
    pub fn set_block(&mut self, block: OverrideBlock) {
        self.set(ParameterValue::Block(block));
    }

    /// Decode `token` for the given slot
    pub(crate) fn decode(token: &str, proto: &ParamPrototype, sink: &mut DiagnosticSink) -> Self {
        let mut source = None;
        let value = if proto.ty != ParamType::Block && is_placeholder(token) {
            ParameterValue::Text(token.to_string())
        } else {
            match proto.ty {
                ParamType::Int => {
                    ParameterValue::Int(checked_number(token, parse_int_prefix, &mut source, sink))
                }
                ParamType::Float => ParameterValue::Float(checked_number(
                    token,
                    parse_float_prefix,
                    &mut source,
                    sink,
                )),
                ParamType::Bool => ParameterValue::Bool(
                    checked_number(token, parse_int_prefix, &mut source, sink) != 0,
                ),
                ParamType::Text => ParameterValue::Text(token.to_string()),
                ParamType::Block => ParameterValue::Block(OverrideBlock::parse_with(token, sink)),
            }
        };

        Self {
            value,
            ty: proto.ty,
            class: proto.class,
            omitted: false,
            source,
        }
    }
}

/// Scripting placeholder check
fn is_placeholder(token: &str) -> bool {
    token.starts_with(['!', '$', '%'])
}

/// Run a prefix parser; a partly consumed token is reported and kept in `source`
fn checked_number<N>(
    token: &str,
    parse: impl Fn(&str) -> (N, usize),
    source: &mut Option<String>,
    sink: &mut DiagnosticSink,
) -> N {
    let (value, consumed) = parse(token);
    if consumed < token.len() {
        tracing::debug!(token, "malformed numeric argument");
        sink.push(DiagnosticKind::MalformedNumber, token);
        *source = Some(token.to_string());
    }
    value
}

/// C `atoi`: optional whitespace and sign, then decimal digits
///
/// Returns the value (saturated to `i32`) and the number of bytes consumed,
/// which is 0 when there is no digit.
pub(crate) fn parse_int_prefix(text: &str) -> (i32, usize) {
    let bytes = text.as_bytes();
    let mut pos = bytes.iter().take_while(|b| b.is_ascii_whitespace()).count();

    let negative = match bytes.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let digits_start = pos;
    let mut acc: i64 = 0;
    while let Some(digit) = bytes.get(pos).filter(|b| b.is_ascii_digit()) {
        acc = acc
            .saturating_mul(10)
            .saturating_add(i64::from(digit - b'0'));
        pos += 1;
    }
    if pos == digits_start {
        return (0, 0);
    }

    let signed = if negative { -acc } else { acc };
    #[allow(clippy::cast_possible_truncation)]
    let value = signed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
    (value, pos)
}

/// C `atof` restricted to decimal notation
///
/// Accepts `[ws][sign]digits[.digits][(e|E)[sign]digits]` where at least one
/// mantissa digit is required. Returns the value and bytes consumed.
pub(crate) fn parse_float_prefix(text: &str) -> (f64, usize) {
    let bytes = text.as_bytes();
    let mut pos = bytes.iter().take_while(|b| b.is_ascii_whitespace()).count();

    let negative = bytes.get(pos) == Some(&b'-');
    if matches!(bytes.get(pos), Some(b'-' | b'+')) {
        pos += 1;
    }
    let count_digits = |from: usize| {
        bytes
            .get(from..)
            .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
    };

    let int_part = &text[pos..pos + count_digits(pos)];
    pos += int_part.len();
    let mut frac_part = "";
    if bytes.get(pos) == Some(&b'.') {
        frac_part = &text[pos + 1..pos + 1 + count_digits(pos + 1)];
        if !int_part.is_empty() || !frac_part.is_empty() {
            pos += 1 + frac_part.len();
        }
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return (0.0, 0);
    }

    let mut exp_part = "";
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut exp = pos + 1;
        if matches!(bytes.get(exp), Some(b'-' | b'+')) {
            exp += 1;
        }
        let exp_digits = count_digits(exp);
        if exp_digits > 0 {
            exp_part = &text[pos + 1..exp + exp_digits];
            pos = exp + exp_digits;
        }
    }

    let literal = format!(
        "{}{}.{}e{}",
        if negative { "-" } else { "" },
        if int_part.is_empty() { "0" } else { int_part },
        if frac_part.is_empty() { "0" } else { frac_part },
        if exp_part.is_empty() { "0" } else { exp_part },
    );
    (literal.parse().unwrap_or(0.0), pos)
}

/// Alpha digits of `&H<aa>&`; everything before the first hex digit is skipped
fn parse_alpha(text: &str) -> i32 {
    let Some(start) = text.find(|c: char| c.is_ascii_hexdigit()) else {
        return 0;
    };
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .collect();
    i64::from_str_radix(&digits, 16).map_or(255, |v| {
        #[allow(clippy::cast_possible_truncation)]
        let clamped = v.clamp(0, 255) as i32;
        clamped
    })
}

/// Format with three decimals, trimming trailing zeros and a bare point
#[must_use]
pub fn float_to_string(value: f64) -> String {
    let mut s = format!("{value:.3}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prototype::ParamPresence;

    fn slot(ty: ParamType, class: ParamClass) -> ParamPrototype {
        ParamPrototype {
            ty,
            class,
            presence: ParamPresence::ALWAYS,
        }
    }

    fn decode(token: &str, ty: ParamType) -> (OverrideParameter, Vec<DiagnosticKind>) {
        let mut sink = DiagnosticSink::default();
        let param = OverrideParameter::decode(token, &slot(ty, ParamClass::Normal), &mut sink);
        let kinds = sink.into_vec().into_iter().map(|d| d.kind).collect();
        (param, kinds)
    }

    #[test]
    fn int_prefix_follows_atoi() {
        assert_eq!(parse_int_prefix("42"), (42, 2));
        assert_eq!(parse_int_prefix("-7px"), (-7, 2));
        assert_eq!(parse_int_prefix("+3"), (3, 2));
        assert_eq!(parse_int_prefix("abc"), (0, 0));
        assert_eq!(parse_int_prefix("-"), (0, 0));
        assert_eq!(parse_int_prefix("99999999999"), (i32::MAX, 11));
    }

    #[test]
    fn float_prefix_follows_atof() {
        assert_eq!(parse_float_prefix("2.5"), (2.5, 3));
        assert_eq!(parse_float_prefix(".5"), (0.5, 2));
        assert_eq!(parse_float_prefix("3."), (3.0, 2));
        assert_eq!(parse_float_prefix("1e3x"), (1000.0, 3));
        assert_eq!(parse_float_prefix("1e"), (1.0, 1));
        assert_eq!(parse_float_prefix("-1.25abc"), (-1.25, 5));
        assert_eq!(parse_float_prefix("."), (0.0, 0));
        assert_eq!(parse_float_prefix("abc"), (0.0, 0));
    }

    #[test]
    fn malformed_numbers_default_to_zero() {
        let (param, kinds) = decode("abc", ParamType::Float);
        assert_eq!(param.value(), Some(&ParameterValue::Float(0.0)));
        assert_eq!(kinds, vec![DiagnosticKind::MalformedNumber]);

        let (param, kinds) = decode("12", ParamType::Int);
        assert_eq!(param.as_int().unwrap(), 12);
        assert!(kinds.is_empty());

        let (param, kinds) = decode("", ParamType::Int);
        assert_eq!(param.as_int().unwrap(), 0);
        assert!(kinds.is_empty());
    }

    #[test]
    fn placeholders_stay_verbatim() {
        for token in ["!line.start!", "$x", "%lstart%"] {
            let (param, kinds) = decode(token, ParamType::Int);
            assert_eq!(param.value(), Some(&ParameterValue::Text(token.to_string())));
            assert_eq!(param.ty(), ParamType::Int);
            assert_eq!(param.encode(), token);
            assert!(kinds.is_empty());
        }
    }

    #[test]
    fn block_slots_parse_tags() {
        let (param, _) = decode("\\fad(1,2)\\b1", ParamType::Block);
        let block = param.as_block().unwrap();
        assert_eq!(block.tags().len(), 2);
        assert_eq!(param.encode(), "\\fad(1,2)\\b1");
    }

    #[test]
    fn float_formatting() {
        assert_eq!(float_to_string(1.5), "1.5");
        assert_eq!(float_to_string(2.0), "2");
        assert_eq!(float_to_string(0.1234), "0.123");
        assert_eq!(float_to_string(-0.0001), "0");
        assert_eq!(float_to_string(100.0), "100");
        assert_eq!(float_to_string(-3.25), "-3.25");
    }

    #[test]
    fn alpha_access() {
        let proto = slot(ParamType::Text, ParamClass::Alpha);
        let mut param = OverrideParameter::omitted(&proto);
        assert!(param.as_int().is_err());

        param.set_int(300);
        assert_eq!(param.encode(), "&HFF&");
        param.set_int(0x3c);
        assert_eq!(param.encode(), "&H3C&");
        assert_eq!(param.as_int().unwrap(), 0x3c);

        param.set_text("H80");
        assert_eq!(param.as_int().unwrap(), 0x80);
        param.set_text("&Hzz&");
        assert_eq!(param.as_int().unwrap(), 0);
    }

    #[test]
    fn typed_getters() {
        let (param, _) = decode("2.75", ParamType::Float);
        assert_eq!(param.as_int().unwrap(), 2);
        assert!(param.as_bool().unwrap());
        assert_eq!(param.as_text().unwrap(), "2.75");
        assert!(matches!(
            param.as_block(),
            Err(OverrideError::TypeMismatch {
                expected: ParamType::Block,
                found: ParamType::Float
            })
        ));

        let (param, _) = decode("&H0000FF&", ParamType::Text);
        assert_eq!(param.as_color().unwrap(), Color::rgb(255, 0, 0));
        assert_eq!(param.as_int().unwrap(), 0);
    }

    #[test]
    fn setters_clear_omitted() {
        let proto = slot(ParamType::Int, ParamClass::RelativeTimeStart);
        let mut param = OverrideParameter::omitted(&proto);
        assert!(param.is_omitted());
        assert_eq!(param.encode(), "");
        assert!(matches!(
            param.as_int(),
            Err(OverrideError::OmittedParameter)
        ));

        param.set_int(250);
        assert!(!param.is_omitted());
        assert_eq!(param.encode(), "250");

        param.set_bool(true);
        assert_eq!(param.encode(), "1");
        param.set_color(Color::rgb(1, 2, 3));
        assert_eq!(param.encode(), "&H030201&");
    }
}
