//! The tree-walking evaluator. Executes a parsed [`Program`] directly
//! against an [`Environment`] using ordinary Rust recursion rather than
//! hand-walking the AST's `parent`/`next` links: each nested block gets its
//! own Rust call frame, so a function's return value lives in a stack-local
//! instead of a slot shared across recursive activations, and loop/`return`
//! unwinding falls out of `?` on [`Signal`].

use std::rc::Rc;

use hk_core::Span;

use crate::builtins;
use crate::compiler::ast::{
    AssignOp, AssignTarget, BinaryOp, Block, Expression, ExpressionKind, FnBody, Program,
    StatementKind, UnaryOp,
};
use crate::complex::Complex;
use crate::environment::Environment;
use crate::error::{Raised, RuntimeError, Signal};
use crate::matrix::Matrix;
use crate::value::{UserFunction, Value};

/// Runs a whole program to completion. A `return` or stray `continue`
/// reaching the top level simply ends execution; only a genuine runtime
/// error is reported.
pub fn run(program: &Program, env: &mut Environment) -> Result<(), Raised> {
    match exec_block(&program.body, env) {
        Ok(()) | Err(Signal::Return(_)) | Err(Signal::Continue) => Ok(()),
        Err(Signal::Error(raised)) => Err(raised),
    }
}

fn exec_block(block: &Block, env: &mut Environment) -> Result<(), Signal> {
    for (_, node) in block.iter() {
        exec_statement(&node.kind, node.span, env)?;
    }
    Ok(())
}

fn exec_statement(kind: &StatementKind, span: Span, env: &mut Environment) -> Result<(), Signal> {
    match kind {
        StatementKind::Expr(expr) => {
            evaluate(expr, env)?;
            Ok(())
        }
        StatementKind::Pass => Ok(()),
        StatementKind::Continue => Err(Signal::Continue),
        StatementKind::Return(expr) => {
            let value = match expr {
                Some(e) => evaluate(e, env)?,
                None => Value::None,
            };
            Err(Signal::Return(value))
        }
        StatementKind::Assign { target, op, value } => {
            let rhs = evaluate(value, env)?;
            apply_assign(target, op, rhs, span, env)?;
            Ok(())
        }
        StatementKind::IncDec { name, increment } => {
            let current = env.get(name).cloned().unwrap_or(Value::None);
            let delta = if *increment { 1 } else { -1 };
            let updated = numeric_add(&current, delta as f64, span)?;
            env.set(name.clone(), updated);
            Ok(())
        }
        StatementKind::If { branches, else_block } => {
            for (cond, body) in branches {
                if evaluate(cond, env)?.is_truthy() {
                    return exec_block(body, env);
                }
            }
            if let Some(body) = else_block {
                exec_block(body, env)?;
            }
            Ok(())
        }
        StatementKind::While { cond, body } => {
            while evaluate(cond, env)?.is_truthy() {
                match exec_block(body, env) {
                    Ok(()) | Err(Signal::Continue) => {}
                    other => return other,
                }
            }
            Ok(())
        }
        // The literal wording of §4.6 restricts `continue` to the nearest
        // enclosing WhileBlock; a `for` loop catches it too here, since the
        // language gives `continue` no other defined meaning inside one and
        // treating it as undefined would just surprise programs that use it.
        StatementKind::For { var, iterable, body } => {
            let collection = evaluate(iterable, env)?;
            for item in iterate(&collection, span)? {
                env.set(var.clone(), item);
                match exec_block(body, env) {
                    Ok(()) | Err(Signal::Continue) => {}
                    other => return other,
                }
            }
            Ok(())
        }
        StatementKind::FnDef { name, params, infix, body } => {
            let func = UserFunction {
                name: name.clone(),
                params: params.clone(),
                infix: *infix,
                body: Rc::new(body.clone()),
                curried: Vec::new(),
            };
            env.set(name.clone(), Value::Function(Rc::new(func)));
            Ok(())
        }
        StatementKind::Del(target) => {
            delete_target(target, span, env)?;
            Ok(())
        }
    }
}

fn numeric_add(value: &Value, delta: f64, span: Span) -> Result<Value, Signal> {
    match value {
        Value::Integer(n) => Ok(Value::Integer(n + delta as i64)),
        Value::Float(f) => Ok(Value::Float(f + delta)),
        other => Err(Signal::Error(Raised::new(
            RuntimeError::TypeMismatch(format!("cannot increment a {}", other.type_name())),
            span,
        ))),
    }
}

// ---- assignment / deletion ----

fn apply_assign(target: &AssignTarget, op: &AssignOp, rhs: Value, span: Span, env: &mut Environment) -> Result<(), Signal> {
    match target {
        AssignTarget::Name(name) => {
            let value = match op {
                AssignOp::Assign => rhs,
                AssignOp::AddAssign => {
                    let current = env.get(name).cloned().unwrap_or(Value::None);
                    eval_binary(BinaryOp::Add, current, rhs, span)?
                }
                AssignOp::SubAssign => {
                    let current = env.get(name).cloned().unwrap_or(Value::None);
                    eval_binary(BinaryOp::Sub, current, rhs, span)?
                }
            };
            env.set(name.clone(), value);
            Ok(())
        }
        AssignTarget::Index(target_expr, indices) => {
            // "Change on FunctionCall" (§4.5): the only Index target the
            // language defines a write for is a Matrix's element access.
            let name = match &target_expr.kind {
                ExpressionKind::Ident(n) => Some(n.clone()),
                _ => None,
            };
            let mut target_value = evaluate(target_expr, env)?;
            let Value::Matrix(ref mut m) = target_value else {
                return Err(Signal::Error(Raised::new(
                    RuntimeError::NotCallable(format!("cannot index-assign into a {}", target_value.type_name())),
                    span,
                )));
            };
            let idx_values: Vec<Value> = indices.iter().map(|e| evaluate(e, env)).collect::<Result<_, _>>()?;
            let (row1, col1) = single_element_indices(m, &idx_values, span)?;
            let scalar = rhs
                .as_complex()
                .ok_or_else(|| Signal::Error(Raised::new(RuntimeError::TypeMismatch("can only assign a number into a matrix element".to_string()), span)))?;
            let current = m.get(row1, col1).map_err(|e| Signal::Error(Raised::new(e, span)))?;
            let new_value = match op {
                AssignOp::Assign => scalar,
                AssignOp::AddAssign => current + scalar,
                AssignOp::SubAssign => current - scalar,
            };
            m.set(row1, col1, new_value).map_err(|e| Signal::Error(Raised::new(e, span)))?;
            if let Some(name) = name {
                env.set(name, target_value);
            }
            Ok(())
        }
    }
}

fn delete_target(target: &AssignTarget, span: Span, env: &mut Environment) -> Result<(), Signal> {
    match target {
        AssignTarget::Name(name) => {
            env.delete(name);
            Ok(())
        }
        AssignTarget::Index(target_expr, indices) => {
            let name = match &target_expr.kind {
                ExpressionKind::Ident(n) => Some(n.clone()),
                _ => None,
            };
            let mut target_value = evaluate(target_expr, env)?;
            let Value::Matrix(ref mut m) = target_value else {
                return Err(Signal::Error(Raised::new(
                    RuntimeError::NotCallable(format!("cannot delete from a {}", target_value.type_name())),
                    span,
                )));
            };
            let idx_values: Vec<Value> = indices.iter().map(|e| evaluate(e, env)).collect::<Result<_, _>>()?;
            let (row1, col1) = single_element_indices(m, &idx_values, span)?;
            m.set(row1, col1, Complex::new(0.0, 0.0)).map_err(|e| Signal::Error(Raised::new(e, span)))?;
            if let Some(name) = name {
                env.set(name, target_value);
            }
            Ok(())
        }
    }
}

/// Resolves an assignment/delete target's index list down to a concrete
/// single `(row, col)` pair — these two write paths only ever touch one
/// element at a time, unlike read indexing's slice/fancy forms.
fn single_element_indices(m: &Matrix, idx_values: &[Value], span: Span) -> Result<(i64, i64), Signal> {
    let as_i64 = |v: &Value| v.as_i64();
    match idx_values {
        [one] => {
            let i = as_i64(one).ok_or_else(|| bad_index(span))?;
            let (rows, cols) = m.shape();
            if rows == 1 {
                Ok((1, i))
            } else if cols == 1 {
                Ok((i, 1))
            } else {
                Err(Signal::Error(Raised::new(
                    RuntimeError::IndexArity("a single index into a non-vector matrix cannot address one element for assignment".to_string()),
                    span,
                )))
            }
        }
        [r, c] => {
            let r = as_i64(r).ok_or_else(|| bad_index(span))?;
            let c = as_i64(c).ok_or_else(|| bad_index(span))?;
            Ok((r, c))
        }
        _ => Err(Signal::Error(Raised::new(
            RuntimeError::IndexArity(format!("expected one or two indices, got {}", idx_values.len())),
            span,
        ))),
    }
}

fn bad_index(span: Span) -> Signal {
    Signal::Error(Raised::new(RuntimeError::TypeMismatch("matrix element assignment requires an integer index".to_string()), span))
}

// ---- expression evaluation ----

pub fn evaluate(expr: &Expression, env: &mut Environment) -> Result<Value, Signal> {
    let span = expr.span;
    match &expr.kind {
        ExpressionKind::IntLit(n) => Ok(Value::Integer(*n)),
        ExpressionKind::FloatLit(f) => Ok(Value::Float(*f)),
        ExpressionKind::ImaginaryLit(f) => Ok(Value::Complex(Complex::new(0.0, *f))),
        ExpressionKind::StringLit(s) => Ok(Value::String(s.clone())),
        ExpressionKind::BoolLit(b) => Ok(Value::Boolean(*b)),
        ExpressionKind::NoneLit => Ok(Value::None),
        ExpressionKind::Ident(name) => Ok(env.get(name).cloned().unwrap_or(Value::None)),

        ExpressionKind::Unary { op, expr } => {
            let value = evaluate(expr, env)?;
            eval_unary(*op, value, span)
        }

        ExpressionKind::Binary { op: BinaryOp::And, lhs, rhs } => {
            let l = evaluate(lhs, env)?;
            if !l.is_truthy() {
                return Ok(l);
            }
            evaluate(rhs, env)
        }
        ExpressionKind::Binary { op: BinaryOp::Or, lhs, rhs } => {
            let l = evaluate(lhs, env)?;
            if l.is_truthy() {
                return Ok(l);
            }
            evaluate(rhs, env)
        }
        ExpressionKind::Binary { op, lhs, rhs } => {
            let l = evaluate(lhs, env)?;
            let r = evaluate(rhs, env)?;
            eval_binary(*op, l, r, span)
        }

        ExpressionKind::Ternary { cond, then_expr, else_expr } => {
            if evaluate(cond, env)?.is_truthy() {
                evaluate(then_expr, env)
            } else {
                evaluate(else_expr, env)
            }
        }
        ExpressionKind::ShortIf { left, cond } => {
            if evaluate(cond, env)?.is_truthy() {
                evaluate(left, env)
            } else {
                Ok(Value::None)
            }
        }
        ExpressionKind::In { item, collection } => {
            let item = evaluate(item, env)?;
            let collection = evaluate(collection, env)?;
            Ok(Value::Boolean(contains(&collection, &item, span)?))
        }

        ExpressionKind::InfixCall { lhs, name, rhs } => {
            let callee = env.get(name).cloned().unwrap_or(Value::None);
            check_infix_postcondition(&callee, name, span)?;
            let l = evaluate(lhs, env)?;
            let r = evaluate(rhs, env)?;
            invoke(callee, vec![l, r], env, span)
        }

        ExpressionKind::Call { callee, args } => {
            let callee_value = match &callee.kind {
                ExpressionKind::Ident(name) => env.get(name).cloned().unwrap_or(Value::None),
                _ => evaluate(callee, env)?,
            };
            if let Value::Matrix(m) = &callee_value {
                let idx_values: Vec<Value> = args.iter().map(|e| evaluate(e, env)).collect::<Result<_, _>>()?;
                return matrix_index(m, &idx_values, span);
            }
            if matches!(callee_value, Value::None) {
                if let ExpressionKind::Ident(name) = &callee.kind {
                    return Err(Signal::Error(Raised::new(RuntimeError::UndefinedName(name.clone()), span)));
                }
            }
            let arg_values: Vec<Value> = args.iter().map(|e| evaluate(e, env)).collect::<Result<_, _>>()?;
            invoke(callee_value, arg_values, env, span)
        }

        ExpressionKind::SpreadCall { callee, args } => {
            let callee_value = evaluate(callee, env)?;
            let arg_values: Vec<Value> = args.iter().map(|e| evaluate(e, env)).collect::<Result<_, _>>()?;
            spread_call(callee_value, arg_values, env, span)
        }

        ExpressionKind::Index { target, indices } => {
            let target_value = evaluate(target, env)?;
            let idx_values: Vec<Value> = indices.iter().map(|e| evaluate(e, env)).collect::<Result<_, _>>()?;
            match &target_value {
                Value::Matrix(m) => matrix_index(m, &idx_values, span),
                other => Err(Signal::Error(Raised::new(
                    RuntimeError::NotCallable(format!("cannot index a {}", other.type_name())),
                    span,
                ))),
            }
        }

        ExpressionKind::SliceLit { start, stop, step } => {
            let conv = |e: &Option<Box<Expression>>, env: &mut Environment| -> Result<Option<i64>, Signal> {
                match e {
                    Some(e) => Ok(Some(
                        evaluate(e, env)?
                            .as_i64()
                            .ok_or_else(|| Signal::Error(Raised::new(RuntimeError::TypeMismatch("slice bounds must be integers".to_string()), span)))?,
                    )),
                    None => Ok(None),
                }
            };
            let start = conv(start, env)?;
            let stop = conv(stop, env)?;
            let step = conv(step, env)?;
            Ok(Value::Slice { start, stop, step })
        }

        ExpressionKind::MatrixLit { rows } => eval_matrix_literal(rows, env, span),

        ExpressionKind::FnLit { params, infix, body } => Ok(Value::Function(Rc::new(UserFunction {
            name: "<anonymous>".to_string(),
            params: params.clone(),
            infix: *infix,
            body: Rc::new(body.clone()),
            curried: Vec::new(),
        }))),
    }
}

fn check_infix_postcondition(callee: &Value, name: &str, span: Span) -> Result<(), Signal> {
    let is_infix = match callee {
        Value::Function(f) => f.infix,
        Value::BuiltinFunction(n) | Value::ContextFunction(n) => builtins::INFIX_BUILTINS.contains(&n.as_str()),
        _ => false,
    };
    if is_infix {
        Ok(())
    } else if matches!(callee, Value::None) {
        Err(Signal::Error(Raised::new(RuntimeError::UndefinedName(name.to_string()), span)))
    } else {
        Err(Signal::Error(Raised::new(
            RuntimeError::PostCondition("This function is not an infix function".to_string()),
            span,
        )))
    }
}

/// `MatrixExpression`/`UnitMatrixExpression`/`MatrixOperation` (§4.5):
/// lift each element into a matrix (a bare scalar becomes 1×1, an existing
/// Matrix is used as-is), concat elements horizontally to build each row,
/// then concat the rows vertically.
fn eval_matrix_literal(rows: &[Vec<Expression>], env: &mut Environment, span: Span) -> Result<Value, Signal> {
    let mut whole = Matrix::empty();
    for row in rows {
        let mut assembled = Matrix::empty();
        for elem in row {
            let value = evaluate(elem, env)?;
            let piece = to_matrix(&value, span)?;
            assembled.concat(&piece, 1).map_err(|e| Signal::Error(Raised::new(e, span)))?;
        }
        whole.concat(&assembled, 0).map_err(|e| Signal::Error(Raised::new(e, span)))?;
    }
    Ok(Value::Matrix(whole))
}

fn to_matrix(value: &Value, span: Span) -> Result<Matrix, Signal> {
    match value {
        Value::Matrix(m) => Ok(m.clone()),
        Value::Complex(c) => Ok(Matrix::scalar_complex(*c)),
        other => other
            .as_f64()
            .map(Matrix::scalar)
            .ok_or_else(|| Signal::Error(Raised::new(RuntimeError::TypeMismatch(format!("cannot place a {} in a matrix literal", other.type_name())), span))),
    }
}

// ---- unary / binary operators ----

fn eval_unary(op: UnaryOp, value: Value, span: Span) -> Result<Value, Signal> {
    match op {
        UnaryOp::Not => Ok(Value::Boolean(!value.is_truthy())),
        UnaryOp::Neg => match value {
            Value::Integer(n) => Ok(Value::Integer(-n)),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Complex(c) => Ok(Value::Complex(-c)),
            Value::Matrix(m) => Ok(Value::Matrix(m.scale(-1.0))),
            other => Err(Signal::Error(Raised::new(RuntimeError::TypeMismatch(format!("cannot negate a {}", other.type_name())), span))),
        },
        UnaryOp::Transpose => match value {
            Value::Matrix(m) => Ok(Value::Matrix(m.transpose())),
            scalar @ (Value::Integer(_) | Value::Float(_) | Value::Complex(_)) => Ok(scalar),
            other => Err(Signal::Error(Raised::new(RuntimeError::TypeMismatch(format!("cannot transpose a {}", other.type_name())), span))),
        },
    }
}

fn is_commutative(op: BinaryOp) -> bool {
    !matches!(op, BinaryOp::Mod)
}

/// Dispatches `l op r`; retries with swapped operands on `NotApplicable`
/// for every commutative-flagged operator (§4.1, §9 "Commutative retry").
/// `calc` itself implements both operand orders directly and correctly for
/// every combination the spec actually describes (so the retry never
/// silently flips the sign of a `-`/`/` that IS defined); it is only ever
/// reached for combinations the spec leaves undefined, where reusing the
/// same calculation with swapped operands is the documented fallback, not a
/// guarantee of mathematical correctness.
fn eval_binary(op: BinaryOp, l: Value, r: Value, span: Span) -> Result<Value, Signal> {
    match calc(op, &l, &r, span) {
        Ok(v) => Ok(v),
        Err(Signal::Error(Raised { error: RuntimeError::NotApplicable, .. })) if is_commutative(op) => {
            match calc(op, &r, &l, span) {
                Ok(v) => Ok(v),
                Err(Signal::Error(Raised { error: RuntimeError::NotApplicable, .. })) => Err(Signal::Error(Raised::new(
                    RuntimeError::TypeMismatch(format!("{:?} is not defined between {} and {}", op, l.type_name(), r.type_name())),
                    span,
                ))),
                other => other,
            }
        }
        other => other,
    }
}

fn not_applicable(span: Span) -> Signal {
    Signal::Error(Raised::new(RuntimeError::NotApplicable, span))
}

fn calc(op: BinaryOp, l: &Value, r: &Value, span: Span) -> Result<Value, Signal> {
    use BinaryOp::*;
    match op {
        Eq => return Ok(Value::Boolean(values_equal(l, r))),
        NotEq => return Ok(Value::Boolean(!values_equal(l, r))),
        _ => {}
    }
    match (l, r) {
        (Value::Complex(_), _) | (_, Value::Complex(_)) if l.as_complex().is_some() && r.as_complex().is_some() => {
            complex_calc(op, l.as_complex().unwrap(), r.as_complex().unwrap(), span)
        }
        (Value::Matrix(m), other) if other.as_f64().is_some() && !matches!(other, Value::Matrix(_)) => {
            matrix_scalar_calc(op, m, other.as_f64().unwrap(), span)
        }
        (other, Value::Matrix(m)) if other.as_f64().is_some() && !matches!(other, Value::Matrix(_)) => {
            scalar_matrix_calc(op, other.as_f64().unwrap(), m, span)
        }
        (Value::Matrix(a), Value::Matrix(b)) => matrix_matrix_calc(op, a, b, span),
        (Value::Slice { .. }, other) if other.as_f64().is_some() => slice_scalar_calc(op, l, other.as_f64().unwrap(), span),
        (other, Value::Slice { .. }) if other.as_f64().is_some() => slice_scalar_calc(op, r, other.as_f64().unwrap(), span),
        _ if l.as_f64().is_some() && r.as_f64().is_some() => numeric_calc(op, l.as_f64().unwrap(), r.as_f64().unwrap(), l, span),
        _ => Err(not_applicable(span)),
    }
}

fn numeric_calc(op: BinaryOp, a: f64, b: f64, original_lhs: &Value, span: Span) -> Result<Value, Signal> {
    use BinaryOp::*;
    let both_int = matches!(original_lhs, Value::Integer(_)) && a.fract() == 0.0 && b.fract() == 0.0;
    let int_result = |v: f64| if both_int { Value::Integer(v as i64) } else { Value::Float(v) };
    match op {
        Add => Ok(int_result(a + b)),
        Sub => Ok(int_result(a - b)),
        Mul => Ok(int_result(a * b)),
        Div => {
            if b == 0.0 {
                return Err(Signal::Error(Raised::new(RuntimeError::Message("division by zero".to_string()), span)));
            }
            Ok(Value::Float(a / b))
        }
        Mod => {
            if b == 0.0 {
                return Err(Signal::Error(Raised::new(RuntimeError::Message("modulo by zero".to_string()), span)));
            }
            Ok(int_result(a.rem_euclid(b)))
        }
        Pow | DotPow => Ok(int_result(a.powf(b))),
        Lt => Ok(Value::Boolean(a < b)),
        LtEq => Ok(Value::Boolean(a <= b)),
        Gt => Ok(Value::Boolean(a > b)),
        GtEq => Ok(Value::Boolean(a >= b)),
        DotMul => Ok(int_result(a * b)),
        Eq | NotEq | And | Or => unreachable!("handled above calc's dispatch"),
    }
}

fn complex_calc(op: BinaryOp, a: Complex, b: Complex, span: Span) -> Result<Value, Signal> {
    use BinaryOp::*;
    let v = match op {
        Add => a + b,
        Sub => a - b,
        Mul | DotMul => a * b,
        Div => {
            if b.re == 0.0 && b.im == 0.0 {
                return Err(Signal::Error(Raised::new(RuntimeError::Message("division by zero".to_string()), span)));
            }
            a / b
        }
        _ => return Err(not_applicable(span)),
    };
    Ok(demote_complex(v))
}

/// Arithmetic can promote a genuinely-complex operand to a pure-real
/// result (e.g. `(1+2i) * (1-2i)`); demote it to a Float so `Display`
/// only ever renders values that are still truly two-part.
fn demote_complex(c: Complex) -> Value {
    if c.im == 0.0 {
        Value::Float(c.re)
    } else {
        Value::Complex(c)
    }
}

fn matrix_scalar_calc(op: BinaryOp, m: &Matrix, k: f64, span: Span) -> Result<Value, Signal> {
    use BinaryOp::*;
    match op {
        Add => Ok(Value::Matrix(m.add_scalar(k))),
        Sub => Ok(Value::Matrix(m.sub_scalar(k))),
        Mul => Ok(Value::Matrix(m.scale(k))),
        Div => Ok(Value::Matrix(m.div_scalar(k))),
        DotPow => Ok(Value::Matrix(m.pow_scalar(k))),
        Pow => Ok(Value::Matrix(m.pow_integer(k).map_err(|e| Signal::Error(Raised::new(e, span)))?)),
        _ => Err(not_applicable(span)),
    }
}

/// `scalar op Matrix`. `/` and `^` aren't described in this order by the
/// spec (only "Matrix / scalar" and "Matrix ^ integer" are) so they fall
/// through to `NotApplicable` and rely on the commutative retry, matching
/// §9's documented (not fixed) retry behavior for undefined combinations.
fn scalar_matrix_calc(op: BinaryOp, k: f64, m: &Matrix, span: Span) -> Result<Value, Signal> {
    use BinaryOp::*;
    let _ = span;
    match op {
        Add => Ok(Value::Matrix(m.add_scalar(k))),
        Sub => Ok(Value::Matrix(m.scalar_sub(k))),
        Mul => Ok(Value::Matrix(m.scale(k))),
        _ => Err(not_applicable(span)),
    }
}

fn matrix_matrix_calc(op: BinaryOp, a: &Matrix, b: &Matrix, span: Span) -> Result<Value, Signal> {
    use BinaryOp::*;
    let wrap = |r: Result<Matrix, RuntimeError>| r.map(Value::Matrix).map_err(|e| Signal::Error(Raised::new(e, span)));
    match op {
        Add => wrap(a.add(b)),
        Sub => wrap(a.sub(b)),
        Mul => wrap(a.matmul(b)),
        DotMul => wrap(a.hadamard(b)),
        DotPow => wrap(a.pow_elementwise(b)),
        _ => Err(not_applicable(span)),
    }
}

fn slice_scalar_calc(op: BinaryOp, slice: &Value, k: f64, span: Span) -> Result<Value, Signal> {
    let Value::Slice { start, stop, step } = slice else { unreachable!() };
    let shift = match op {
        BinaryOp::Add => k as i64,
        BinaryOp::Sub => -(k as i64),
        _ => return Err(not_applicable(span)),
    };
    Ok(Value::Slice { start: start.map(|v| v + shift), stop: stop.map(|v| v + shift), step: *step })
}

// ---- equality ----

pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::None, Value::None) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Matrix(x), Value::Matrix(y)) => x == y,
        (Value::Slice { start: s1, stop: e1, step: p1 }, Value::Slice { start: s2, stop: e2, step: p2 }) => {
            s1 == s2 && e1 == e2 && p1 == p2
        }
        (Value::Complex(_), _) | (_, Value::Complex(_)) => match (a.as_complex(), b.as_complex()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

// ---- membership / iteration ----

fn contains(collection: &Value, item: &Value, span: Span) -> Result<bool, Signal> {
    match collection {
        Value::Matrix(m) => Ok(m.vector().iter().any(|v| values_equal(&value_from_complex(*v), item))),
        Value::String(s) => match item {
            Value::String(needle) => Ok(s.contains(needle.as_str())),
            _ => Ok(false),
        },
        Value::Slice { .. } => {
            let ids = materialize_slice(collection, None, span)?;
            let target = item.as_i64();
            Ok(target.is_some() && ids.contains(&target.unwrap()))
        }
        other => Err(Signal::Error(Raised::new(RuntimeError::TypeMismatch(format!("{} is not a container", other.type_name())), span))),
    }
}

fn iterate(value: &Value, span: Span) -> Result<Vec<Value>, Signal> {
    match value {
        Value::Matrix(m) => Ok(m.vector().into_iter().map(value_from_complex).collect()),
        Value::Slice { .. } => Ok(materialize_slice(value, None, span)?.into_iter().map(Value::Integer).collect()),
        Value::String(s) => Ok(s.chars().map(|c| Value::String(c.to_string())).collect()),
        other => Err(Signal::Error(Raised::new(RuntimeError::TypeMismatch(format!("cannot iterate a {}", other.type_name())), span))),
    }
}

fn scalar_value(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        Value::Integer(v as i64)
    } else {
        Value::Float(v)
    }
}

/// Demotes a matrix element read back out to a `Value`: a real element
/// becomes a plain `Integer`/`Float` like any other number, a genuinely
/// complex one becomes `Value::Complex`.
fn value_from_complex(c: Complex) -> Value {
    if c.im == 0.0 {
        scalar_value(c.re)
    } else {
        Value::Complex(c)
    }
}

/// `(a:b:c)` materialized to `[a, a+c, ..]` up to but excluding `b` (§8
/// invariant 4). `default_dim_len` supplies a missing `stop` when
/// materializing against a known dimension length (indexing); membership
/// and `for` require a fully-bounded slice and pass `None`.
fn materialize_slice(value: &Value, default_dim_len: Option<i64>, span: Span) -> Result<Vec<i64>, Signal> {
    let Value::Slice { start, stop, step } = value else { unreachable!() };
    let step = step.unwrap_or(1);
    let start = start.unwrap_or(1);
    let stop = match stop.or(default_dim_len.map(|n| n + 1)) {
        Some(s) => s,
        None => {
            return Err(Signal::Error(Raised::new(
                RuntimeError::TypeMismatch("a slice needs a stop bound to be materialized here".to_string()),
                span,
            )))
        }
    };
    Ok(materialize_range(start, stop, step))
}

fn materialize_range(start: i64, stop: i64, step: i64) -> Vec<i64> {
    if step == 0 {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut v = start;
    if step > 0 {
        while v < stop {
            out.push(v);
            v += step;
        }
    } else {
        while v > stop {
            out.push(v);
            v += step;
        }
    }
    out
}

// ---- matrix indexing ----

enum IndexSpec {
    Single(i64),
    Multi(Vec<i64>),
}

fn index_spec(value: &Value, dim_len: usize, span: Span) -> Result<IndexSpec, Signal> {
    match value {
        Value::Integer(_) | Value::Float(_) => Ok(IndexSpec::Single(value.as_i64().ok_or_else(|| invalid_index(span))?)),
        Value::Slice { .. } => Ok(IndexSpec::Multi(materialize_slice(value, Some(dim_len as i64), span)?)),
        Value::Matrix(m) => Ok(IndexSpec::Multi(m.vector().iter().map(|v| v.re as i64).collect())),
        _ => Err(invalid_index(span)),
    }
}

fn invalid_index(span: Span) -> Signal {
    Signal::Error(Raised::new(RuntimeError::TypeMismatch("invalid matrix index".to_string()), span))
}

fn wrap_result(m: Matrix) -> Value {
    match m.as_scalar_complex() {
        Some(c) => value_from_complex(c),
        None => Value::Matrix(m),
    }
}

/// `m[i]` / `m[i,j]` / `m(i)` / `m(i,j)` read dispatch (§4.1).
fn matrix_index(m: &Matrix, idx_values: &[Value], span: Span) -> Result<Value, Signal> {
    let (rows, cols) = m.shape();
    match idx_values {
        [one] => {
            if rows == 1 {
                match index_spec(one, cols, span)? {
                    IndexSpec::Single(c) => Ok(value_from_complex(m.get(1, c).map_err(|e| Signal::Error(Raised::new(e, span)))?)),
                    IndexSpec::Multi(cs) => Ok(wrap_result(m.select_cols(&cs).map_err(|e| Signal::Error(Raised::new(e, span)))?)),
                }
            } else if cols == 1 {
                match index_spec(one, rows, span)? {
                    IndexSpec::Single(r) => Ok(value_from_complex(m.get(r, 1).map_err(|e| Signal::Error(Raised::new(e, span)))?)),
                    IndexSpec::Multi(rs) => Ok(wrap_result(m.select_rows(&rs).map_err(|e| Signal::Error(Raised::new(e, span)))?)),
                }
            } else {
                match index_spec(one, rows, span)? {
                    IndexSpec::Single(r) => Ok(Value::Matrix(m.row(r).map_err(|e| Signal::Error(Raised::new(e, span)))?)),
                    IndexSpec::Multi(rs) => Ok(wrap_result(m.select_rows(&rs).map_err(|e| Signal::Error(Raised::new(e, span)))?)),
                }
            }
        }
        [r, c] => {
            let rspec = index_spec(r, rows, span)?;
            let cspec = index_spec(c, cols, span)?;
            let result = match (rspec, cspec) {
                (IndexSpec::Single(r), IndexSpec::Single(c)) => {
                    return Ok(value_from_complex(m.get(r, c).map_err(|e| Signal::Error(Raised::new(e, span)))?))
                }
                (IndexSpec::Single(r), IndexSpec::Multi(cs)) => m.select(&[r], &cs),
                (IndexSpec::Multi(rs), IndexSpec::Single(c)) => m.select(&rs, &[c]),
                (IndexSpec::Multi(rs), IndexSpec::Multi(cs)) => m.select(&rs, &cs),
            };
            Ok(wrap_result(result.map_err(|e| Signal::Error(Raised::new(e, span)))?))
        }
        _ => Err(Signal::Error(Raised::new(
            RuntimeError::IndexArity(format!("expected one or two indices, got {}", idx_values.len())),
            span,
        ))),
    }
}

// ---- calling ----

fn invoke(callee: Value, args: Vec<Value>, env: &mut Environment, span: Span) -> Result<Value, Signal> {
    match callee {
        Value::Function(f) => call_user_function(&f, args, env, span),
        Value::BuiltinFunction(name) | Value::ContextFunction(name) => {
            builtins::call(&name, &args, env, span).map_err(Signal::Error)
        }
        Value::Matrix(m) => matrix_index(&m, &args, span),
        other => Err(Signal::Error(Raised::new(RuntimeError::NotCallable(other.type_name().to_string()), span))),
    }
}

fn call_user_function(f: &Rc<UserFunction>, args: Vec<Value>, env: &mut Environment, span: Span) -> Result<Value, Signal> {
    let needed = f.arguments_needed();
    if args.len() < needed {
        return Ok(Value::Function(Rc::new(f.with_more_curried(args))));
    }
    if args.len() > needed {
        return Err(Signal::Error(Raised::new(RuntimeError::ArityTooMany(f.name.clone(), needed, args.len()), span)));
    }
    let mut all_args = f.curried.clone();
    all_args.extend(args);
    for (param, value) in f.params.iter().zip(all_args) {
        env.set(param.name.clone(), value);
    }
    match f.body.as_ref() {
        FnBody::Expr(expr) => evaluate(expr, env),
        FnBody::Block(block) => match exec_block(block, env) {
            Ok(()) => Ok(Value::None),
            Err(Signal::Return(value)) => Ok(value),
            Err(Signal::Continue) => Err(Signal::Error(Raised::new(RuntimeError::Message("continue outside of a loop".to_string()), span))),
            Err(err @ Signal::Error(_)) => Err(err),
        },
    }
}

/// `f.(x, y)` (§4.5): invokes `f` once per corresponding element of its
/// arguments, repeating scalar arguments; the result takes the shape of the
/// first Matrix argument.
fn spread_call(callee: Value, args: Vec<Value>, env: &mut Environment, span: Span) -> Result<Value, Signal> {
    let shape = args.iter().find_map(|a| match a {
        Value::Matrix(m) => Some(m.shape()),
        _ => None,
    });
    let Some((rows, cols)) = shape else {
        return invoke(callee, args, env, span);
    };
    let len = rows * cols;
    let columns: Vec<Vec<Value>> = args
        .iter()
        .map(|a| match a {
            Value::Matrix(m) => {
                let v = m.vector();
                if v.len() != len {
                    return Err(Signal::Error(Raised::new(
                        RuntimeError::MatrixDimension("spread call arguments must share one shape or be scalars".to_string()),
                        span,
                    )));
                }
                Ok(v.into_iter().map(value_from_complex).collect())
            }
            other => Ok(vec![other.clone(); len]),
        })
        .collect::<Result<_, _>>()?;
    let mut results = Vec::with_capacity(len);
    for i in 0..len {
        let call_args: Vec<Value> = columns.iter().map(|col| col[i].clone()).collect();
        let v = invoke(callee.clone(), call_args, env, span)?;
        results.push(v.as_f64().ok_or_else(|| {
            Signal::Error(Raised::new(RuntimeError::TypeMismatch("spread call results must be numeric to build a matrix".to_string()), span))
        })?);
    }
    Ok(Value::Matrix(Matrix::from_flat(results, rows, cols)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use crate::compiler::lexer::Lexer;
    use crate::compiler::parser::Parser;

    fn run_source(src: &str) -> Environment {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        let mut env = Environment::new();
        builtins::seed(&mut env);
        run(&program, &mut env).unwrap();
        env
    }

    #[test]
    fn adds_and_binds_a_variable() {
        let env = run_source("x = 3\ny = x + 4\n");
        assert!(matches!(env.get("y"), Some(Value::Integer(7))));
    }

    #[test]
    fn currying_returns_a_partially_applied_function() {
        let env = run_source("f = fn(a,b): a+b\ng = f(2)\nresult = g(5)\n");
        assert!(matches!(env.get("result"), Some(Value::Integer(7))));
    }

    #[test]
    fn infix_call_invokes_a_flagged_function() {
        let env = run_source("infix fn plus(a,b): a+b\nresult = 2 plus 3\n");
        assert!(matches!(env.get("result"), Some(Value::Integer(5))));
    }

    #[test]
    fn non_infix_function_used_infix_raises_postcondition() {
        let tokens = Lexer::new("fn plus(a,b): a+b\nresult = 2 plus 3\n").tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        let mut env = Environment::new();
        builtins::seed(&mut env);
        let err = run(&program, &mut env).unwrap_err();
        assert!(matches!(err.error, RuntimeError::PostCondition(_)));
    }

    #[test]
    fn while_continue_skips_the_rest_of_the_body() {
        let env = run_source("x = 0\nwhile x < 3:\n\tx += 1\n\tif x == 2: continue\nx = x\n");
        assert!(matches!(env.get("x"), Some(Value::Integer(3))));
    }

    #[test]
    fn matrix_literal_builds_rows_then_stacks_them() {
        let env = run_source("A = [1,2;3,4]\n");
        match env.get("A") {
            Some(Value::Matrix(m)) => {
                assert_eq!(m.shape(), (2, 2));
                assert_eq!(m.get(2, 1).unwrap().re, 3.0);
            }
            _ => panic!("expected a matrix"),
        }
    }

    #[test]
    fn transpose_of_matrix_literal_pretty_prints_with_one_bracket_pair() {
        let env = run_source("A = [1,2;3,4]\nB = A'\n");
        match env.get("B") {
            Some(Value::Matrix(m)) => assert_eq!(m.pretty_print(), "[ 1 3\n  2 4 ]"),
            _ => panic!("expected a matrix"),
        }
    }

    #[test]
    fn single_row_matrix_indexes_by_column() {
        let env = run_source("v = [10, 20, 30]\nx = v[2]\n");
        assert!(matches!(env.get("x"), Some(Value::Integer(20))));
    }

    #[test]
    fn matrix_assignment_writes_through_the_handle() {
        let env = run_source("A = [1,2;3,4]\nA(1,1) = 9\n");
        match env.get("A") {
            Some(Value::Matrix(m)) => assert_eq!(m.get(1, 1).unwrap().re, 9.0),
            _ => panic!("expected a matrix"),
        }
    }

    #[test]
    fn chained_comparison_requires_every_link() {
        let env = run_source("a = 1\nb = 2\nc = 3\nresult = a < b < c\n");
        assert!(matches!(env.get("result"), Some(Value::Boolean(true))));
        let env = run_source("a = 1\nb = 5\nc = 3\nresult = a < b < c\n");
        assert!(matches!(env.get("result"), Some(Value::Boolean(false))));
    }

    #[test]
    fn short_if_without_else_yields_none_when_falsy() {
        let env = run_source("result = 5 if False\n");
        assert!(matches!(env.get("result"), Some(Value::None)));
    }

    #[test]
    fn sqrt_of_negative_prints_both_complex_parts() {
        let env = run_source("x = sqrt(-4)\n");
        match env.get("x") {
            Some(Value::Complex(c)) => {
                assert_eq!(c.re, 0.0);
                assert_eq!(c.im, 2.0);
            }
            other => panic!("expected complex, got {other:?}"),
        }
    }

    #[test]
    fn slice_materializes_excluding_the_stop_bound() {
        let ids = materialize_range(1, 10, 3);
        assert_eq!(ids, vec![1, 4, 7]);
    }

    #[test]
    fn matrix_literal_accepts_complex_elements() {
        let env = run_source("A = [i, 2i]\n");
        match env.get("A") {
            Some(Value::Matrix(m)) => {
                assert_eq!(m.shape(), (1, 2));
                assert_eq!(m.get(1, 1).unwrap(), Complex::new(0.0, 1.0));
                assert_eq!(m.get(1, 2).unwrap(), Complex::new(0.0, 2.0));
            }
            other => panic!("expected matrix, got {other:?}"),
        }
    }

    #[test]
    fn indexing_a_complex_matrix_element_yields_a_complex_value() {
        let env = run_source("A = [i, 2]\nx = A[1]\n");
        assert!(matches!(env.get("x"), Some(Value::Complex(c)) if *c == Complex::new(0.0, 1.0)));
    }

    #[test]
    fn spread_call_broadcasts_scalars_against_a_matrix() {
        let env = run_source("f = fn(a,b): a+b\nM = [1,2;3,4]\nR = f.(M, 1)\n");
        match env.get("R") {
            Some(Value::Matrix(m)) => assert_eq!(m.vector().iter().map(|c| c.re).collect::<Vec<_>>(), vec![2.0, 3.0, 4.0, 5.0]),
            other => panic!("expected matrix, got {other:?}"),
        }
    }
}
