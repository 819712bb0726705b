//! Brainfuck interpreter.
//!
//! Cells are unbounded signed integers on a sparse tape, so the pointer may go
//! negative and values never wrap. `,` reads the next input character; at the
//! end of input it leaves the cell untouched and rewinds the input. An
//! unmatched `]` is ignored and an unmatched `[` ends the program.

use crate::errors::{Error, Result};
use std::collections::HashMap;

/// Default number of instructions a program may execute
pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

/// Runs `code` against `input` with the default step budget.
pub fn run(code: &str, input: &str) -> Result<String> {
    Interpreter::new(DEFAULT_STEP_LIMIT).run(code, input)
}

/// A reusable interpreter configuration.
#[derive(Debug, Clone, Copy)]
pub struct Interpreter {
    step_limit: u64,
}

impl Interpreter {
    /// Creates an interpreter that stops after `step_limit` instructions.
    #[must_use]
    pub const fn new(step_limit: u64) -> Self {
        Self { step_limit }
    }

    /// Executes a program and returns everything it printed.
    ///
    /// # Errors
    /// Returns [`Error::StepLimitExceeded`] when the budget runs out.
    pub fn run(&self, code: &str, input: &str) -> Result<String> {
        let program: Vec<char> = code
            .chars()
            .filter(|c| matches!(c, '>' | '<' | '+' | '-' | '.' | ',' | '[' | ']'))
            .collect();
        let jumps = match_brackets(&program);
        let input: Vec<char> = input.chars().collect();

        let mut tape: HashMap<i64, i64> = HashMap::new();
        let mut pointer: i64 = 0;
        let mut input_pos = 0;
        let mut output = String::new();
        let mut pc = 0;
        let mut steps: u64 = 0;

        while pc < program.len() {
            steps += 1;
            if steps > self.step_limit {
                return Err(Error::StepLimitExceeded {
                    limit: self.step_limit,
                });
            }

            match program[pc] {
                '>' => pointer += 1,
                '<' => pointer -= 1,
                '+' => *tape.entry(pointer).or_insert(0) += 1,
                '-' => *tape.entry(pointer).or_insert(0) -= 1,
                '.' => {
                    let value = tape.get(&pointer).copied().unwrap_or(0);
                    let ch = u32::try_from(value)
                        .ok()
                        .and_then(char::from_u32)
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    output.push(ch);
                }
                ',' => {
                    if let Some(&ch) = input.get(input_pos) {
                        tape.insert(pointer, i64::from(u32::from(ch)));
                        input_pos += 1;
                    } else {
                        input_pos = 0;
                    }
                }
                '[' => match jumps[pc] {
                    Some(end) if tape.get(&pointer).copied().unwrap_or(0) == 0 => pc = end,
                    Some(_) => {}
                    None => break,
                },
                ']' => {
                    if let Some(start) = jumps[pc] {
                        if tape.get(&pointer).copied().unwrap_or(0) != 0 {
                            pc = start;
                        }
                    }
                }
                _ => {}
            }
            pc += 1;
        }

        Ok(output)
    }
}

/// For every bracket, the index of its partner; None when unmatched.
fn match_brackets(program: &[char]) -> Vec<Option<usize>> {
    let mut jumps = vec![None; program.len()];
    let mut open = Vec::new();

    for (index, &ch) in program.iter().enumerate() {
        match ch {
            '[' => open.push(index),
            ']' => {
                if let Some(start) = open.pop() {
                    jumps[start] = Some(index);
                    jumps[index] = Some(start);
                }
            }
            _ => {}
        }
    }
    jumps
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const HELLO: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

    #[test]
    fn test_hello_world() {
        assert_eq!(run(HELLO, "").unwrap(), "Hello World!\n");
    }

    #[test]
    fn test_echo_input_rewinds() {
        // Reads three chars from a two-char input: the third read hits the end
        // and leaves the cell untouched, the fourth starts over.
        let output = run(",.,.,.,.", "ab").unwrap();
        assert_eq!(output, "abba");
    }

    #[test]
    fn test_negative_pointer_and_cells() {
        assert_eq!(run("<-.", "").unwrap(), "\u{FFFD}");
    }

    #[test]
    fn test_unmatched_brackets() {
        // Stray `]` is ignored
        assert_eq!(run("+++++++++++++++++++++++++++++++++.]", "").unwrap(), "!");
        // Unmatched `[` ends the program
        assert_eq!(run("+[.", "").unwrap(), "");
    }

    #[test]
    fn test_skips_loop_on_zero() {
        assert_eq!(run("[.]", "").unwrap(), "");
    }

    #[test]
    fn test_step_limit() {
        let result = Interpreter::new(1_000).run("+[]", "");
        assert!(matches!(
            result,
            Err(Error::StepLimitExceeded { limit: 1_000 })
        ));
    }

    #[test]
    fn test_comments_are_ignored() {
        assert_eq!(run("add 33: +++++++++++++++++++++++++++++++++ print: .", "").unwrap(), "!");
    }
}
