//! Render rules: the format-spec mini language used to turn values into text
//!
//! A spec has the shape `[[fill]align][0][width][type]`:
//!
//! - `align` is one of `<` (left), `>` (right), `^` (center) or `=` (pad
//!   after the sign, integers only)
//! - a leading `0` before the width selects zero padding after the sign
//! - `type` is `d` (integer) or `s` (string); without it any value renders
//!
//! For example `0=3d` renders `5` as `005` and `x>6` renders `abcd` as `xxabcd`.

use std::fmt;

use crate::error::ResolverError;
use crate::value::TokenValue;

/// Alignment of a rendered value within its minimum width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
    /// Padding goes between the sign and the digits
    AfterSign,
}

impl Align {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '^' => Some(Align::Center),
            '=' => Some(Align::AfterSign),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Align::Left => '<',
            Align::Right => '>',
            Align::Center => '^',
            Align::AfterSign => '=',
        }
    }
}

/// Value type a render rule accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderType {
    Int,
    Str,
}

/// Widest padding a spec may request
pub const MAX_WIDTH: usize = 4096;

/// A parsed format spec
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderRule {
    spec: String,
    fill: Option<char>,
    align: Option<Align>,
    width: usize,
    render_type: Option<RenderType>,
}

impl RenderRule {
    /// Parse a format spec
    pub fn parse(spec: &str) -> Result<Self, ResolverError> {
        let invalid = |reason: &str| ResolverError::InvalidFormatSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let chars: Vec<char> = spec.chars().collect();
        let mut pos = 0;
        let mut fill = None;
        let mut align = None;

        if let Some(a) = chars.get(1).copied().and_then(Align::from_char) {
            fill = Some(chars[0]);
            align = Some(a);
            pos = 2;
        } else if let Some(a) = chars.first().copied().and_then(Align::from_char) {
            align = Some(a);
            pos = 1;
        }

        // Zero flag: only meaningful when no explicit fill/alignment was given
        if chars.get(pos) == Some(&'0') {
            if fill.is_none() && align.is_none() {
                fill = Some('0');
                align = Some(Align::AfterSign);
            }
            pos += 1;
        }

        let digits: String = chars[pos..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        pos += digits.len();
        let width = if digits.is_empty() {
            0
        } else {
            digits.parse().map_err(|_| invalid("width is too large"))?
        };
        if width > MAX_WIDTH {
            return Err(invalid(&format!("width {} exceeds {}", width, MAX_WIDTH)));
        }

        let render_type = match chars.get(pos) {
            None => None,
            Some('d') => Some(RenderType::Int),
            Some('s') => Some(RenderType::Str),
            Some(c) => return Err(invalid(&format!("unsupported type '{}'", c))),
        };
        if render_type.is_some() {
            pos += 1;
        }
        if pos != chars.len() {
            return Err(invalid("unexpected trailing characters"));
        }
        if render_type == Some(RenderType::Str) && align == Some(Align::AfterSign) {
            return Err(invalid("'=' alignment is not allowed for strings"));
        }

        Ok(Self {
            spec: spec.to_string(),
            fill,
            align,
            width,
            render_type,
        })
    }

    /// Synthesize a spec from padding options: `{padchar}{padalign}{padmin}{type}`
    pub fn padded(
        padchar: char,
        padalign: char,
        padmin: usize,
        render_type: Option<RenderType>,
    ) -> Result<Self, ResolverError> {
        let suffix = match render_type {
            Some(RenderType::Int) => "d",
            Some(RenderType::Str) => "s",
            None => "",
        };
        Self::parse(&format!("{}{}{}{}", padchar, padalign, padmin, suffix))
    }

    /// Rule with no padding and only a type constraint
    pub fn typed(render_type: Option<RenderType>) -> Self {
        let spec = match render_type {
            Some(RenderType::Int) => "d",
            Some(RenderType::Str) => "s",
            None => "",
        };
        Self {
            spec: spec.to_string(),
            render_type,
            ..Self::default()
        }
    }

    /// The spec text this rule was built from
    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn render_type(&self) -> Option<RenderType> {
        self.render_type
    }

    /// Render a value, failing with a reason if the rule does not accept it
    pub fn render(&self, value: &TokenValue) -> Result<String, String> {
        let (sign, body) = match (self.render_type, value) {
            (Some(RenderType::Str), TokenValue::Int(_)) => {
                return Err("expected a string value".to_string())
            }
            (Some(RenderType::Int), TokenValue::Str(_)) => {
                return Err("expected an integer value".to_string())
            }
            (_, TokenValue::Int(n)) if *n < 0 => ("-", n.unsigned_abs().to_string()),
            (_, TokenValue::Int(n)) => ("", n.to_string()),
            (_, TokenValue::Str(s)) => {
                if self.align == Some(Align::AfterSign) {
                    return Err("'=' alignment is not allowed for strings".to_string());
                }
                ("", s.clone())
            }
        };

        let len = sign.chars().count() + body.chars().count();
        if len >= self.width {
            return Ok(format!("{}{}", sign, body));
        }

        let fill = self.fill.unwrap_or(' ');
        let pad = self.width - len;
        let repeat = |n: usize| fill.to_string().repeat(n);
        let default_align = match value {
            TokenValue::Int(_) => Align::Right,
            TokenValue::Str(_) => Align::Left,
        };

        Ok(match self.align.unwrap_or(default_align) {
            Align::Left => format!("{}{}{}", sign, body, repeat(pad)),
            Align::Right => format!("{}{}{}", repeat(pad), sign, body),
            Align::Center => {
                let left = pad / 2;
                format!("{}{}{}{}", repeat(left), sign, body, repeat(pad - left))
            }
            Align::AfterSign => format!("{}{}{}", sign, repeat(pad), body),
        })
    }
}

impl fmt::Display for RenderRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}
