//! The dynamic value type every `.hk` expression evaluates to.

use std::fmt;
use std::rc::Rc;

use crate::compiler::ast::Param;
use crate::complex::Complex;
use crate::matrix::Matrix;

#[derive(Debug, Clone)]
pub struct UserFunction {
    pub name: String,
    pub params: Vec<Param>,
    pub infix: bool,
    pub body: Rc<crate::compiler::ast::FnBody>,
    /// Arguments already bound by a previous partial application (§4.5
    /// currying). `arguments_needed() == params.len() - curried.len()`.
    pub curried: Vec<Value>,
}

impl UserFunction {
    pub fn arguments_needed(&self) -> usize {
        self.params.len() - self.curried.len()
    }

    /// Returns a new function with `more` appended to the curried list,
    /// sharing the same body and parameter list (§8 invariant 2).
    pub fn with_more_curried(&self, more: Vec<Value>) -> UserFunction {
        let mut curried = self.curried.clone();
        curried.extend(more);
        UserFunction { name: self.name.clone(), params: self.params.clone(), infix: self.infix, body: self.body.clone(), curried }
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    None,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Complex(Complex),
    String(String),
    Slice { start: Option<i64>, stop: Option<i64>, step: Option<i64> },
    Matrix(Matrix),
    Function(Rc<UserFunction>),
    /// A seeded builtin that needs no environment access: `sqrt`, `det`, ...
    BuiltinFunction(String),
    /// A seeded builtin that reads or touches the environment: `print`.
    ContextFunction(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Complex(_) => "Complex",
            Value::String(_) => "String",
            Value::Slice { .. } => "Slice",
            Value::Matrix(_) => "Matrix",
            Value::Function(_) => "Function",
            Value::BuiltinFunction(_) => "BuiltinFunction",
            Value::ContextFunction(_) => "ContextFunction",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Boolean(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Complex(c) => c.re != 0.0 || c.im != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Matrix(m) => !m.is_empty(),
            Value::Slice { .. } => true,
            Value::Function(_) | Value::BuiltinFunction(_) | Value::ContextFunction(_) => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            Value::Matrix(m) => m.as_scalar(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<Complex> {
        match self {
            Value::Complex(c) => Some(*c),
            _ => self.as_f64().map(|r| Complex::new(r, 0.0)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Boolean(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Complex(c) => write!(f, "{c}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Slice { start, stop, step } => {
                write!(f, "{}:{}:{}", opt(*start), opt(*stop), opt(*step))
            }
            Value::Matrix(m) => write!(f, "{m}"),
            Value::Function(func) => write!(f, "<fn {}>", func.name),
            Value::BuiltinFunction(name) | Value::ContextFunction(name) => write!(f, "<builtin {name}>"),
        }
    }
}

fn opt(v: Option<i64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values_are_falsy() {
        assert!(!Value::Integer(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::Integer(1).is_truthy());
    }

    #[test]
    fn scalar_matrix_coerces_to_f64() {
        let m = Value::Matrix(Matrix::scalar(3.0));
        assert_eq!(m.as_f64(), Some(3.0));
    }
}
