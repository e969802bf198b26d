//! Peephole optimization over the instruction IR.
//!
//! One rule: an unconditional jump whose target is the label immediately
//! following it is a no-op, and both instructions are removed. All matches
//! are collected before anything is deleted, so later indices stay valid.
//!
//! The pass is single-shot and needs no fixed point: each rewrite deletes
//! a label, and a deleted label can never become newly adjacent to a
//! different jump through this rule alone.

use crate::ir::Instr;

/// Remove redundant jump/label pairs in place.
pub fn optimize(instrs: &mut Vec<Instr>) {
  let mut remove = vec![false; instrs.len()];

  let mut i = 0;
  while i + 1 < instrs.len() {
    if let (Instr::Jump(target), Instr::Label(label)) = (&instrs[i], &instrs[i + 1])
      && target == label
    {
      remove[i] = true;
      remove[i + 1] = true;
      i += 2;
      continue;
    }
    i += 1;
  }

  let mut index = 0;
  instrs.retain(|_| {
    let keep = !remove[index];
    index += 1;
    keep
  });
}

#[cfg(test)]
mod tests {
  use super::*;

  fn jump(label: &str) -> Instr {
    Instr::Jump(label.to_string())
  }

  fn label(name: &str) -> Instr {
    Instr::Label(name.to_string())
  }

  #[test]
  fn removes_jump_to_next_label() {
    let mut instrs = vec![Instr::FrameSetup, jump("__block0_end"), label("__block0_end")];
    optimize(&mut instrs);
    assert_eq!(instrs, vec![Instr::FrameSetup]);
  }

  #[test]
  fn keeps_pairs_with_different_names() {
    let mut instrs = vec![jump("__continue0"), label("__else0"), label("__continue0")];
    let before = instrs.clone();
    optimize(&mut instrs);
    assert_eq!(instrs, before);
  }

  #[test]
  fn keeps_conditional_jumps() {
    let mut instrs = vec![Instr::JumpEq("__else0".into()), label("__else0")];
    let before = instrs.clone();
    optimize(&mut instrs);
    assert_eq!(instrs, before);
  }

  #[test]
  fn removes_multiple_pairs_in_one_pass() {
    let mut instrs = vec![
      jump("__block0_end"),
      label("__block0_end"),
      Instr::Ret,
      jump("__block1_end"),
      label("__block1_end"),
    ];
    optimize(&mut instrs);
    assert_eq!(instrs, vec![Instr::Ret]);
  }

  #[test]
  fn is_idempotent() {
    let mut instrs = vec![
      Instr::FrameSetup,
      jump("__block0_end"),
      label("__block0_end"),
      jump("__w_begin0"),
      label("__w_continue0"),
    ];
    optimize(&mut instrs);
    let once = instrs.clone();
    optimize(&mut instrs);
    assert_eq!(instrs, once);
  }
}
