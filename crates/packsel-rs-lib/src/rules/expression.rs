//! Textual condition expressions.
//!
//! An expression is a chain of condition ids joined by `+` (and), `|` (or) or `\` (xor).
//! Operators are left-associative with no precedence, `a|b+c` is `(a|b)+c`.
//! A leading `!` negates a single id.

use serde::{Serialize, Deserialize};

use crate::Error::Parse;

/// Characters that can't appear inside a condition id.
pub(crate) const OPERATORS: [char; 3] = ['+', '|', '\\'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
	And,
	Or,
	Xor,
}

impl Operator {
	fn from_char(c: char) -> Option<Self> {
		match c {
			'+' => Some(Operator::And),
			'|' => Some(Operator::Or),
			'\\' => Some(Operator::Xor),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Expression {
	/// A reference to a registered condition, optionally negated.
	Term { id: String, negated: bool },
	And(Box<Expression>, Box<Expression>),
	Or(Box<Expression>, Box<Expression>),
	Xor(Box<Expression>, Box<Expression>),
}

impl Expression {
	pub fn parse(s: &str) -> crate::Result<Self> {
		fn term(raw: &str, source: &str) -> crate::Result<Expression> {
			let raw = raw.trim();
			let (negated, id) = match raw.strip_prefix('!') {
				Some(rest) => (true, rest.trim()),
				None => (false, raw),
			};
			if id.is_empty() || id.starts_with('!') {
				return Err(Parse(format!("missing condition id in expression \"{}\"", source)));
			}
			Ok(Expression::Term { id: id.to_string(), negated })
		}

		let mut expr: Option<Expression> = None;
		let mut pending: Option<Operator> = None;
		let mut start = 0;

		/* Walk the string once, folding each finished term into the left-hand side */
		for (i, c) in s.char_indices().chain(std::iter::once((s.len(), '+'))) {
			let Some(op) = Operator::from_char(c) else { continue };
			let rhs = term(&s[start..i], s)?;
			expr = Some(match (expr.take(), pending) {
				(None, _) => rhs,
				(Some(lhs), Some(Operator::And)) => Expression::And(Box::new(lhs), Box::new(rhs)),
				(Some(lhs), Some(Operator::Or)) => Expression::Or(Box::new(lhs), Box::new(rhs)),
				(Some(lhs), Some(Operator::Xor)) => Expression::Xor(Box::new(lhs), Box::new(rhs)),
				(Some(_), None) => unreachable!("an operator always precedes a second term"),
			});
			pending = Some(op);
			start = i + c.len_utf8();
		}

		expr.ok_or_else(|| Parse(format!("empty expression \"{}\"", s)))
	}

	/// Every condition id this expression refers to, in the order they appear.
	pub fn references(&self) -> Vec<&str> {
		match self {
			Expression::Term { id, .. } => vec![id.as_str()],
			Expression::And(l, r) | Expression::Or(l, r) | Expression::Xor(l, r) => {
				let mut v = l.references();
				v.extend(r.references());
				v
			},
		}
	}
}

impl std::str::FromStr for Expression {
	type Err = crate::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Expression::parse(s)
	}
}

impl TryFrom<String> for Expression {
	type Error = crate::Error;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Expression::parse(&value)
	}
}

impl From<Expression> for String {
	fn from(value: Expression) -> Self {
		value.to_string()
	}
}

impl std::fmt::Display for Expression {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Expression::Term { id, negated: true } => write!(f, "!{}", id),
			Expression::Term { id, negated: false } => write!(f, "{}", id),
			Expression::And(l, r) => write!(f, "{}+{}", l, r),
			Expression::Or(l, r) => write!(f, "{}|{}", l, r),
			Expression::Xor(l, r) => write!(f, "{}\\{}", l, r),
		}
	}
}
