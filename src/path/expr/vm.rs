//! A stack evaluator for compiled filter expressions.

use super::compiler::Op;
use crate::element::Element;
use crate::spec::ElementType;

/// The evaluation stack holds tagged values; `Elem` slots are views into the
/// document under evaluation.
#[derive(Clone, Debug)]
pub(crate) enum Slot<'a> {
    Bool(bool),
    Int(i64),
    Str(String),
    Elem(Element<'a>),
}

const STACK_CAPACITY: usize = 32;

/// Evaluates a compiled program against a document context, returning the
/// value left on the stack.
///
/// Program errors (division by zero, stack exhaustion, operand type
/// mismatches) abort the evaluation and yield `None`; the selector treats
/// that as `false`. A `load` that selects nothing short-circuits the whole
/// program to `false`.
pub(crate) fn eval<'s>(doc: &'s [u8], code: &[Op]) -> Option<Slot<'s>> {
    let mut stack: Vec<Slot<'s>> = Vec::with_capacity(STACK_CAPACITY);

    for op in code {
        match op {
            Op::Neg => {
                let value = int_operand(stack.pop()?)?;
                stack.push(Slot::Int(value.checked_neg()?));
            }
            Op::Pos => {
                let value = int_operand(stack.pop()?)?;
                stack.push(Slot::Int(value));
            }
            Op::Not => match stack.pop()? {
                Slot::Bool(value) => stack.push(Slot::Bool(!value)),
                _ => return None,
            },
            Op::Add => arith(&mut stack, i64::checked_add)?,
            Op::Sub => arith(&mut stack, i64::checked_sub)?,
            Op::Mul => arith(&mut stack, i64::checked_mul)?,
            Op::Div => arith(&mut stack, |a, b| {
                if b == 0 {
                    None
                } else {
                    a.checked_div(b)
                }
            })?,
            Op::Eq => {
                let rhs = stack.pop()?;
                let lhs = stack.pop()?;
                stack.push(Slot::Bool(slots_equal(&lhs, &rhs)));
            }
            Op::Neq => {
                let rhs = stack.pop()?;
                let lhs = stack.pop()?;
                stack.push(Slot::Bool(!slots_equal(&lhs, &rhs)));
            }
            Op::Lt => order(&mut stack, |o| o.is_lt())?,
            Op::Lte => order(&mut stack, |o| o.is_le())?,
            Op::Gt => order(&mut stack, |o| o.is_gt())?,
            Op::Gte => order(&mut stack, |o| o.is_ge())?,
            Op::And => logical(&mut stack, |a, b| a && b)?,
            Op::Or => logical(&mut stack, |a, b| a || b)?,
            Op::Load(path) => {
                let mut matches = Vec::new();
                crate::path::select(doc, path, &mut matches).ok()?;
                if matches.is_empty() {
                    return Some(Slot::Bool(false));
                }
                for element in matches {
                    push(&mut stack, Slot::Elem(element))?;
                }
            }
            Op::Store(slot) => {
                let value = stack.pop()?;
                if *slot < stack.len() {
                    stack[*slot] = value;
                } else {
                    return None;
                }
            }
            Op::PushInt(value) => push(&mut stack, Slot::Int(*value))?,
            Op::PushStr(value) => push(&mut stack, Slot::Str(value.clone()))?,
            Op::PushTrue => push(&mut stack, Slot::Bool(true))?,
            Op::PushFalse => push(&mut stack, Slot::Bool(false))?,
        }
    }

    stack.pop()
}

fn push<'s>(stack: &mut Vec<Slot<'s>>, slot: Slot<'s>) -> Option<()> {
    if stack.len() >= STACK_CAPACITY {
        return None;
    }
    stack.push(slot);
    Some(())
}

/// Projects an element-view slot onto its primitive: booleans to `Bool`,
/// int32/int64 to `Int`, strings to `Str`. Other element types keep the
/// element slot.
fn project(slot: Slot<'_>) -> Slot<'_> {
    match slot {
        Slot::Elem(element) => match element.element_type() {
            ElementType::Boolean => match element.as_bool() {
                Ok(value) => Slot::Bool(value),
                Err(_) => Slot::Elem(element),
            },
            ElementType::Int32 => match element.as_i32() {
                Ok(value) => Slot::Int(value as i64),
                Err(_) => Slot::Elem(element),
            },
            ElementType::Int64 => match element.as_i64() {
                Ok(value) => Slot::Int(value),
                Err(_) => Slot::Elem(element),
            },
            ElementType::String => match element.as_str() {
                Ok(value) => Slot::Str(value.to_string()),
                Err(_) => Slot::Elem(element),
            },
            _ => Slot::Elem(element),
        },
        other => other,
    }
}

fn int_operand(slot: Slot<'_>) -> Option<i64> {
    match project(slot) {
        Slot::Int(value) => Some(value),
        _ => None,
    }
}

fn arith(stack: &mut Vec<Slot<'_>>, op: impl Fn(i64, i64) -> Option<i64>) -> Option<()> {
    let rhs = int_operand(stack.pop()?)?;
    let lhs = int_operand(stack.pop()?)?;
    stack.push(Slot::Int(op(lhs, rhs)?));
    Some(())
}

fn logical(stack: &mut Vec<Slot<'_>>, op: impl Fn(bool, bool) -> bool) -> Option<()> {
    let rhs = stack.pop()?;
    let lhs = stack.pop()?;
    match (lhs, rhs) {
        (Slot::Bool(lhs), Slot::Bool(rhs)) => {
            stack.push(Slot::Bool(op(lhs, rhs)));
            Some(())
        }
        _ => None,
    }
}

/// Ordering is defined for two integers or two strings; element-views are
/// projected onto their primitives first. Any other combination is a
/// program error.
fn order(stack: &mut Vec<Slot<'_>>, accept: impl Fn(std::cmp::Ordering) -> bool) -> Option<()> {
    let rhs = project(stack.pop()?);
    let lhs = project(stack.pop()?);
    let ordering = match (&lhs, &rhs) {
        (Slot::Int(lhs), Slot::Int(rhs)) => lhs.cmp(rhs),
        (Slot::Str(lhs), Slot::Str(rhs)) => lhs.cmp(rhs),
        _ => return None,
    };
    stack.push(Slot::Bool(accept(ordering)));
    Some(())
}

/// Equality across slots: element-views compare via their primitive
/// projection, and primitives compare when they have the same kind. Any
/// operand without a primitive projection compares unequal.
fn slots_equal(lhs: &Slot<'_>, rhs: &Slot<'_>) -> bool {
    let lhs = project(lhs.clone());
    let rhs = project(rhs.clone());
    match (lhs, rhs) {
        (Slot::Bool(lhs), Slot::Bool(rhs)) => lhs == rhs,
        (Slot::Int(lhs), Slot::Int(rhs)) => lhs == rhs,
        (Slot::Str(lhs), Slot::Str(rhs)) => lhs == rhs,
        _ => false,
    }
}
