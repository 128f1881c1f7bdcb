//! The seeded global environment: constants, configuration flags, and the
//! builtin functions every `.hk` program starts with.

use hk_core::Span;

use crate::complex::Complex;
use crate::environment::Environment;
use crate::error::{Raised, RuntimeError};
use crate::matrix::Matrix;
use crate::value::Value;

const MATRIX_BUILTINS: &[&str] = &[
    "cross", "det", "diagonal", "dot", "eye", "inv", "max", "min", "norm", "ones", "rank",
    "reshape", "trace", "transpose", "zeros",
];

const COMPLEX_BUILTINS: &[&str] = &["conj", "imag", "phase", "polar", "real"];

const MATH_BUILTINS: &[&str] = &[
    "abs", "acos", "acosh", "asin", "asinh", "atan", "atanh", "cos", "cosh", "exp", "log", "sin",
    "sinh", "sqrt", "tan", "tanh",
];

const CONTEXT_BUILTINS: &[&str] = &["print"];

/// Names callable from infix position (`a name b`) without an explicit
/// `infix fn` declaration.
pub const INFIX_BUILTINS: &[&str] = &["eq", "dot", "cross"];

pub fn is_builtin(name: &str) -> bool {
    matches!(name, "len" | "slice" | "str" | "eq")
        || MATRIX_BUILTINS.contains(&name)
        || COMPLEX_BUILTINS.contains(&name)
        || MATH_BUILTINS.contains(&name)
}

pub fn seed(env: &mut Environment) {
    env.set("e", Value::Float(std::f64::consts::E));
    env.set("pi", Value::Float(std::f64::consts::PI));
    env.set("i", Value::Complex(Complex::new(0.0, 1.0)));
    env.set("pretty_print", Value::Boolean(true));

    for name in ["len", "slice", "str", "eq"]
        .into_iter()
        .chain(MATRIX_BUILTINS.iter().copied())
        .chain(COMPLEX_BUILTINS.iter().copied())
        .chain(MATH_BUILTINS.iter().copied())
    {
        env.set(name, Value::BuiltinFunction(name.to_string()));
    }
    for name in CONTEXT_BUILTINS {
        env.set(*name, Value::ContextFunction(name.to_string()));
    }
}

fn arity(name: &str, args: &[Value], want: usize, span: Span) -> Result<(), Raised> {
    if args.len() != want {
        let err = if args.len() > want {
            RuntimeError::ArityTooMany(name.to_string(), want, args.len())
        } else {
            RuntimeError::ArityTooFew(name.to_string(), want, args.len())
        };
        return Err(Raised::new(err, span));
    }
    Ok(())
}

fn want_f64(name: &str, v: &Value, span: Span) -> Result<f64, Raised> {
    v.as_f64()
        .ok_or_else(|| Raised::new(RuntimeError::TypeMismatch(format!("{name} expects a number")), span))
}

fn want_matrix<'a>(name: &str, v: &'a Value, span: Span) -> Result<&'a Matrix, Raised> {
    match v {
        Value::Matrix(m) => Ok(m),
        _ => Err(Raised::new(RuntimeError::TypeMismatch(format!("{name} expects a matrix")), span)),
    }
}

fn want_usize(name: &str, v: &Value, span: Span) -> Result<usize, Raised> {
    v.as_i64()
        .filter(|n| *n >= 0)
        .map(|n| n as usize)
        .ok_or_else(|| Raised::new(RuntimeError::TypeMismatch(format!("{name} expects a non-negative integer")), span))
}

fn sqrt_value(x: f64) -> Value {
    if x >= 0.0 {
        Value::Float(x.sqrt())
    } else {
        Value::Complex(Complex::new(0.0, (-x).sqrt()))
    }
}

/// Demotes a `Complex` matrix reduction (`trace`, `det`, `dot`) to a plain
/// `Float` when it came out purely real, mirroring `Value`'s own promotion
/// rules for arithmetic results.
fn complex_to_value(c: Complex) -> Value {
    if c.im == 0.0 {
        Value::Float(c.re)
    } else {
        Value::Complex(c)
    }
}

/// Dispatches a call to a builtin named `name`. `env` is only consulted by
/// the context builtins (`print`'s pretty-print flag).
pub fn call(name: &str, args: &[Value], env: &Environment, span: Span) -> Result<Value, Raised> {
    match name {
        "print" => {
            let pretty = env.get("pretty_print").map(Value::is_truthy).unwrap_or(true);
            if let [Value::Matrix(m)] = args {
                if pretty {
                    println!("{}", m.pretty_print());
                } else {
                    println!("{}", m.compact());
                }
                return Ok(Value::None);
            }
            let rendered: Vec<String> = args
                .iter()
                .map(|v| match v {
                    Value::Matrix(m) => m.compact(),
                    other => other.to_string(),
                })
                .collect();
            println!("{}", rendered.join(" "));
            Ok(Value::None)
        }
        "len" => {
            arity(name, args, 1, span)?;
            match &args[0] {
                Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
                Value::Matrix(m) => {
                    let (r, c) = m.shape();
                    Ok(Value::Integer((r * c) as i64))
                }
                other => Err(Raised::new(RuntimeError::TypeMismatch(format!("len() has no meaning for a {}", other.type_name())), span)),
            }
        }
        "str" => {
            arity(name, args, 1, span)?;
            Ok(Value::String(args[0].to_string()))
        }
        "slice" => {
            arity(name, args, 3, span)?;
            let to_i64 = |v: &Value| v.as_i64();
            Ok(Value::Slice { start: to_i64(&args[0]), stop: to_i64(&args[1]), step: to_i64(&args[2]) })
        }
        "eq" => {
            arity(name, args, 2, span)?;
            Ok(Value::Boolean(crate::interpreter::values_equal(&args[0], &args[1])))
        }

        "zeros" => {
            arity(name, args, 2, span)?;
            let r = want_usize(name, &args[0], span)?;
            let c = want_usize(name, &args[1], span)?;
            Ok(Value::Matrix(Matrix::zeros(r, c)))
        }
        "ones" => {
            arity(name, args, 2, span)?;
            let r = want_usize(name, &args[0], span)?;
            let c = want_usize(name, &args[1], span)?;
            Ok(Value::Matrix(Matrix::ones(r, c)))
        }
        "eye" => {
            arity(name, args, 1, span)?;
            let n = want_usize(name, &args[0], span)?;
            Ok(Value::Matrix(Matrix::eye(n)))
        }
        "transpose" => {
            arity(name, args, 1, span)?;
            Ok(Value::Matrix(want_matrix(name, &args[0], span)?.transpose()))
        }
        "trace" => {
            arity(name, args, 1, span)?;
            let t = want_matrix(name, &args[0], span)?.trace().map_err(|e| Raised::new(e, span))?;
            Ok(complex_to_value(t))
        }
        "diagonal" => {
            arity(name, args, 1, span)?;
            Ok(Value::Matrix(want_matrix(name, &args[0], span)?.diagonal()))
        }
        "det" => {
            arity(name, args, 1, span)?;
            let d = want_matrix(name, &args[0], span)?.det().map_err(|e| Raised::new(e, span))?;
            Ok(complex_to_value(d))
        }
        "inv" => {
            arity(name, args, 1, span)?;
            Ok(Value::Matrix(want_matrix(name, &args[0], span)?.inv().map_err(|e| Raised::new(e, span))?))
        }
        "rank" => {
            arity(name, args, 1, span)?;
            Ok(Value::Integer(want_matrix(name, &args[0], span)?.rank().map_err(|e| Raised::new(e, span))? as i64))
        }
        "reshape" => {
            arity(name, args, 3, span)?;
            let m = want_matrix(name, &args[0], span)?;
            let r = want_usize(name, &args[1], span)?;
            let c = want_usize(name, &args[2], span)?;
            Ok(Value::Matrix(m.reshape(r, c).map_err(|e| Raised::new(e, span))?))
        }
        "max" => {
            arity(name, args, 1, span)?;
            Ok(Value::Float(want_matrix(name, &args[0], span)?.max().map_err(|e| Raised::new(e, span))?))
        }
        "min" => {
            arity(name, args, 1, span)?;
            Ok(Value::Float(want_matrix(name, &args[0], span)?.min().map_err(|e| Raised::new(e, span))?))
        }
        "norm" => {
            arity(name, args, 1, span)?;
            Ok(Value::Float(want_matrix(name, &args[0], span)?.norm()))
        }
        "dot" => {
            arity(name, args, 2, span)?;
            let a = want_matrix(name, &args[0], span)?;
            let b = want_matrix(name, &args[1], span)?;
            let d = a.dot(b).map_err(|e| Raised::new(e, span))?;
            Ok(complex_to_value(d))
        }
        "cross" => {
            arity(name, args, 2, span)?;
            let a = want_matrix(name, &args[0], span)?;
            let b = want_matrix(name, &args[1], span)?;
            Ok(Value::Matrix(a.cross(b).map_err(|e| Raised::new(e, span))?))
        }

        "real" => {
            arity(name, args, 1, span)?;
            Ok(Value::Float(args[0].as_complex().map(|c| c.real()).unwrap_or(0.0)))
        }
        "imag" => {
            arity(name, args, 1, span)?;
            Ok(Value::Float(args[0].as_complex().map(|c| c.imag()).unwrap_or(0.0)))
        }
        "conj" => {
            arity(name, args, 1, span)?;
            let c = args[0].as_complex().unwrap_or(Complex::new(0.0, 0.0)).conj();
            Ok(Value::Complex(c))
        }
        "phase" => {
            arity(name, args, 1, span)?;
            Ok(Value::Float(args[0].as_complex().map(|c| c.phase()).unwrap_or(0.0)))
        }
        "polar" => {
            arity(name, args, 1, span)?;
            let (r, theta) = args[0].as_complex().unwrap_or(Complex::new(0.0, 0.0)).polar();
            Ok(Value::Matrix(Matrix::from_flat(vec![r, theta], 1, 2)))
        }

        "sqrt" => {
            arity(name, args, 1, span)?;
            Ok(sqrt_value(want_f64(name, &args[0], span)?))
        }
        "abs" => {
            arity(name, args, 1, span)?;
            match &args[0] {
                Value::Complex(c) => Ok(Value::Float(c.norm())),
                other => Ok(Value::Float(want_f64(name, other, span)?.abs())),
            }
        }
        "exp" => unary_math(name, args, span, f64::exp),
        "log" => unary_math(name, args, span, f64::ln),
        "sin" => unary_math(name, args, span, f64::sin),
        "cos" => unary_math(name, args, span, f64::cos),
        "tan" => unary_math(name, args, span, f64::tan),
        "asin" => unary_math(name, args, span, f64::asin),
        "acos" => unary_math(name, args, span, f64::acos),
        "atan" => unary_math(name, args, span, f64::atan),
        "sinh" => unary_math(name, args, span, f64::sinh),
        "cosh" => unary_math(name, args, span, f64::cosh),
        "tanh" => unary_math(name, args, span, f64::tanh),
        "asinh" => unary_math(name, args, span, f64::asinh),
        "acosh" => unary_math(name, args, span, f64::acosh),
        "atanh" => unary_math(name, args, span, f64::atanh),

        _ => Err(Raised::new(RuntimeError::UndefinedName(name.to_string()), span)),
    }
}

fn unary_math(name: &str, args: &[Value], span: Span, f: impl Fn(f64) -> f64) -> Result<Value, Raised> {
    arity(name, args, 1, span)?;
    Ok(Value::Float(f(want_f64(name, &args[0], span)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Environment {
        let mut env = Environment::new();
        seed(&mut env);
        env
    }

    #[test]
    fn sqrt_of_negative_promotes_to_complex() {
        let span = Span::dummy();
        let result = call("sqrt", &[Value::Integer(-4)], &env(), span).unwrap();
        assert!(matches!(result, Value::Complex(c) if c.im == 2.0));
    }

    #[test]
    fn eye_builds_identity() {
        let span = Span::dummy();
        let result = call("eye", &[Value::Integer(2)], &env(), span).unwrap();
        match result {
            Value::Matrix(m) => assert_eq!(m.get(1, 1).unwrap().re, 1.0),
            _ => panic!("expected matrix"),
        }
    }

    #[test]
    fn wrong_arity_is_an_error() {
        let span = Span::dummy();
        let err = call("sqrt", &[], &env(), span).unwrap_err();
        assert!(matches!(err.error, RuntimeError::ArityTooFew(..)));
    }

    #[test]
    fn diagonal_builds_rather_than_extracts() {
        let span = Span::dummy();
        let v = Value::Matrix(Matrix::from_flat(vec![1.0, 2.0, 3.0], 1, 3));
        let result = call("diagonal", &[v], &env(), span).unwrap();
        match result {
            Value::Matrix(m) => {
                assert_eq!(m.shape(), (3, 3));
                assert_eq!(m.get(2, 2).unwrap().re, 2.0);
                assert_eq!(m.get(1, 2).unwrap().re, 0.0);
            }
            other => panic!("expected matrix, got {other:?}"),
        }
    }

    #[test]
    fn print_with_zero_or_many_args_does_not_raise_an_arity_error() {
        let span = Span::dummy();
        assert!(call("print", &[], &env(), span).is_ok());
        assert!(call("print", &[Value::Integer(1), Value::Integer(2)], &env(), span).is_ok());
    }
}
