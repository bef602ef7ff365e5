//! Positional control-flow heuristics.
//!
//! Serialized bytecode carries no block markers, so loop, `else`, `break`
//! and `continue` shapes are recognised from jump geometry alone. These
//! rules are approximations: a `goto` to a loop's first statement and a
//! `continue` produce identical bytecode, and the rules below pick one.

use ubcd_ir::{Instruction, Token};
use ubcd_isa::{DEFAULT_CASE_TARGET, Opcode};

/// Logical size of an unconditional jump.
pub const JUMP_SIZE: u32 = 3;

/// Logical size of the iterator-advance instruction closing a `foreach`.
pub const ITERATOR_NEXT_SIZE: u32 = 1;

/// Top-level instruction whose logical end is `end`.
pub fn token_ending_at(tokens: &[Instruction], end: u32) -> Option<&Instruction> {
    let i = tokens.partition_point(|t| t.end() < end);
    tokens.get(i).filter(|t| t.end() == end)
}

fn index_at(tokens: &[Instruction], position: u32) -> Option<usize> {
    tokens.binary_search_by_key(&position, |t| t.position).ok()
}

/// A forward `JumpIfNot` whose block ends with a jump back to it.
pub fn is_while_guard(guard: &Instruction, tokens: &[Instruction]) -> bool {
    let Token::JumpIfNot { target, .. } = guard.token else {
        return false;
    };
    let target = target as u32;
    target > guard.end()
        && token_ending_at(tokens, target).is_some_and(|t| {
            t.opcode == Opcode::Jump && t.jump_target() == Some(guard.position)
        })
}

/// A backward `JumpIfNot`: the `until` of a `do` loop starting at its target.
pub fn is_do_until(insn: &Instruction) -> bool {
    matches!(insn.token, Token::JumpIfNot { target, .. } if (target as u32) <= insn.position)
}

/// Backward jump to a `while` loop's guard that is not the loop's own
/// closing jump.
pub fn is_loop_continue(jump_position: u32, target: u32, loop_start: u32, loop_end: u32) -> bool {
    target == loop_start && jump_position + JUMP_SIZE != loop_end
}

/// Jump to the iterator-advance instruction just before a `foreach` ends.
pub fn is_foreach_continue(target: u32, foreach_end: u32) -> bool {
    target + ITERATOR_NEXT_SIZE == foreach_end
}

/// Jump to the end of the innermost breakable block.
pub fn is_break(target: u32, breakable_end: Option<u32>) -> bool {
    breakable_end == Some(target)
}

/// Forward jump ending exactly where the innermost pending `if` closes.
pub fn is_else(jump_end: u32, target: u32, if_end: Option<u32>) -> bool {
    if_end == Some(jump_end) && target > jump_end
}

/// Logical end of the `switch` at `switch_index`.
///
/// Without a `default` the case chain lands on the end. With one, the end is
/// the nearest `break` target past the `default`; when every case returns
/// instead, it is the end of the first top-level `return` after `default`,
/// and failing that `limit`. The result never passes `limit`, the end of the
/// block enclosing the switch.
pub fn switch_end(tokens: &[Instruction], switch_index: usize, limit: u32) -> u32 {
    scan_switch_end(tokens, switch_index, limit).min(limit)
}

fn scan_switch_end(tokens: &[Instruction], switch_index: usize, limit: u32) -> u32 {
    let code_end = limit;
    let Some(switch) = tokens.get(switch_index) else {
        return code_end;
    };
    let mut pos = switch.end();
    let default_index = loop {
        let Some(mut i) = index_at(tokens, pos) else {
            return pos;
        };
        while tokens[i].opcode.is_hidden() {
            i += 1;
            let Some(next) = tokens.get(i) else {
                return code_end;
            };
            pos = next.position;
        }
        match tokens[i].token {
            Token::Case { target, .. } if target == DEFAULT_CASE_TARGET => break i,
            Token::Case { target, .. } if (target as u32) > pos => pos = target as u32,
            Token::Case { .. } => return code_end,
            _ => return pos,
        }
    };
    let default_pos = tokens[default_index].position;

    let break_target = tokens[switch_index + 1..default_index]
        .iter()
        .filter(|t| t.opcode == Opcode::Jump)
        .filter_map(|t| t.jump_target())
        .filter(|&target| target > default_pos)
        .min();
    if let Some(end) = break_target {
        return end;
    }

    let mut open_until = 0;
    for t in tokens[default_index + 1..]
        .iter()
        .take_while(|t| t.position < limit)
    {
        match t.token {
            Token::JumpIfNot { target, .. } if (target as u32) > t.position => {
                open_until = open_until.max(target as u32);
            }
            Token::Return(_) | Token::ReturnNothing(_) if t.position >= open_until => {
                return t.end();
            }
            _ => {}
        }
    }
    code_end
}

/// The compiler-generated `return;` closing a body.
pub fn is_implicit_return(tokens: &[Instruction], index: usize) -> bool {
    let Some(insn) = tokens.get(index) else {
        return false;
    };
    let empty = match &insn.token {
        Token::Return(value) => value.opcode == Opcode::Nothing,
        Token::ReturnNothing(_) => true,
        _ => false,
    };
    empty
        && tokens[index + 1..].iter().all(|t| {
            t.opcode.is_hidden() || matches!(t.opcode, Opcode::EndOfScript | Opcode::Nothing)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jump(opcode: Opcode, position: u32, size: u32, token: Token) -> Instruction {
        Instruction {
            raw: 0,
            opcode,
            position,
            size,
            storage_position: position,
            storage_size: size,
            token,
        }
    }

    fn plain(opcode: Opcode, position: u32, size: u32) -> Instruction {
        jump(opcode, position, size, Token::NoOperands)
    }

    fn cond(position: u32, target: u16) -> Instruction {
        jump(
            Opcode::JumpIfNot,
            position,
            4,
            Token::JumpIfNot {
                target,
                condition: Box::new(plain(Opcode::True, position + 3, 1)),
            },
        )
    }

    #[test]
    fn continue_excludes_closing_jump() {
        // while guard at 0, closing jump at 17 ends the loop at 20.
        assert!(!is_loop_continue(17, 0, 0, 20));
        assert!(is_loop_continue(9, 0, 0, 20));
        assert!(!is_loop_continue(9, 4, 0, 20));
    }

    #[test]
    fn foreach_continue_targets_iterator_next() {
        assert!(is_foreach_continue(29, 30));
        assert!(!is_foreach_continue(30, 30));
    }

    #[test]
    fn else_needs_matching_if_end() {
        assert!(is_else(10, 20, Some(10)));
        assert!(!is_else(10, 20, Some(12)));
        assert!(!is_else(10, 8, Some(10)));
        assert!(!is_else(10, 20, None));
        assert!(is_break(20, Some(20)));
        assert!(!is_break(20, None));
    }

    #[test]
    fn while_guard_shape() {
        let tokens = vec![
            cond(0, 8),
            plain(Opcode::Nothing, 4, 1),
            jump(Opcode::Jump, 5, 3, Token::Jump { target: 0 }),
            plain(Opcode::Stop, 8, 1),
        ];
        assert!(is_while_guard(&tokens[0], &tokens));

        let if_only = vec![cond(0, 5), plain(Opcode::Nothing, 4, 1), plain(Opcode::Stop, 5, 1)];
        assert!(!is_while_guard(&if_only[0], &if_only));
        assert!(is_do_until(&cond(9, 4)));
        assert!(!is_do_until(&cond(0, 8)));
    }

    #[test]
    fn switch_end_stays_inside_enclosing_block() {
        let ret = |position| {
            jump(
                Opcode::Return,
                position,
                2,
                Token::Return(Box::new(plain(Opcode::Nothing, position + 1, 1))),
            )
        };
        let tokens = vec![
            jump(
                Opcode::Switch,
                0,
                3,
                Token::Switch {
                    property: None,
                    size: 1,
                    value: Box::new(plain(Opcode::True, 2, 1)),
                },
            ),
            jump(
                Opcode::Case,
                3,
                3,
                Token::Case {
                    target: DEFAULT_CASE_TARGET,
                    value: None,
                },
            ),
            plain(Opcode::Stop, 6, 1),
            plain(Opcode::Stop, 7, 1),
            ret(8),
            plain(Opcode::EndOfScript, 10, 1),
        ];
        assert_eq!(switch_end(&tokens, 0, 11), 10);
        assert_eq!(switch_end(&tokens, 0, 7), 7);
    }

    #[test]
    fn implicit_return_only_at_tail() {
        let ret = || {
            jump(
                Opcode::Return,
                0,
                2,
                Token::Return(Box::new(plain(Opcode::Nothing, 1, 1))),
            )
        };
        let mut tail = ret();
        tail.position = 4;
        let tokens = vec![plain(Opcode::Stop, 0, 1), tail, plain(Opcode::EndOfScript, 6, 1)];
        assert!(is_implicit_return(&tokens, 1));
        assert!(!is_implicit_return(&[ret(), plain(Opcode::Stop, 2, 1)], 0));
    }
}
