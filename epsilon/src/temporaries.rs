use crate::{Expr, ExprKind, LexicalAddress, Stmt, SyntaxForest};

/// Stack-like pool of temporary slots in one activation record.
#[derive(Debug)]
pub struct TemporaryPool {
    first_position: usize,
    in_use: Vec<bool>,
}

impl TemporaryPool {
    pub fn new(first_position: usize) -> Self {
        Self {
            first_position,
            in_use: Vec::new(),
        }
    }

    /// Lowest free slot, growing the pool when every slot is taken.
    pub fn get(&mut self) -> LexicalAddress {
        let index = match self.in_use.iter().position(|used| !used) {
            Some(index) => index,
            None => {
                self.in_use.push(false);
                self.in_use.len() - 1
            }
        };
        self.in_use[index] = true;
        LexicalAddress::temporary(index + self.first_position)
    }

    pub fn release(&mut self, address: LexicalAddress) {
        if !address.is_temporary() {
            return;
        }
        if let Some(used) = address
            .position()
            .checked_sub(self.first_position)
            .and_then(|index| self.in_use.get_mut(index))
        {
            *used = false;
        }
    }

    /// Slots the record must reserve for temporaries.
    pub fn count(&self) -> usize {
        self.in_use.len()
    }
}

/// Pre-pass that gives every expression a slot: children first, then the
/// children's slots are released and the parent takes one.
#[derive(Debug)]
pub struct TemporaryAllocator {
    pool: TemporaryPool,
}

impl TemporaryAllocator {
    pub fn new(first_position: usize) -> Self {
        Self {
            pool: TemporaryPool::new(first_position),
        }
    }

    /// Returns the number of temporaries `forest` needs.
    pub fn allocate(mut self, forest: &mut SyntaxForest) -> usize {
        for statement in forest.statements_mut() {
            self.visit_statement(statement);
        }
        self.pool.count()
    }

    fn visit_statement(&mut self, statement: &mut Stmt) {
        let expr = match statement {
            Stmt::Expr(expr) => expr,
            Stmt::Return { expr, .. } => expr,
            Stmt::Bind { value, .. } => value,
        };
        self.visit(expr, true);
        self.pool.release(expr.temporary);
    }

    // `release_recipient` is cleared for the head of a cascade so its
    // recipient stays live for the messages that follow.
    fn visit(&mut self, expr: &mut Expr, release_recipient: bool) {
        match &mut expr.kind {
            ExprKind::Identifier(_) => {
                expr.temporary = LexicalAddress::NO_TEMPORARY;
                return;
            }
            ExprKind::Send(send) => {
                self.visit(&mut send.recipient, true);
                for param in send.params.iter_mut() {
                    self.visit(param, true);
                }
                if release_recipient {
                    self.pool.release(send.recipient.temporary);
                }
                for param in send.params.iter() {
                    self.pool.release(param.temporary);
                }
            }
            ExprKind::CoalescedSend(send) => {
                self.visit(&mut send.previous, false);
                for param in send.params.iter_mut() {
                    self.visit(param, true);
                }
                if release_recipient {
                    let recipient = send.recipient().temporary;
                    self.pool.release(recipient);
                }
                self.pool.release(send.previous.temporary);
                for param in send.params.iter() {
                    self.pool.release(param.temporary);
                }
            }
            ExprKind::Equals(lhs, rhs) => {
                self.visit(lhs, true);
                self.visit(rhs, true);
                self.pool.release(lhs.temporary);
                self.pool.release(rhs.temporary);
            }
            // block bodies were allocated against their own record
            ExprKind::New(_)
            | ExprKind::ClassName(_)
            | ExprKind::Integer(_)
            | ExprKind::Float(_)
            | ExprKind::Char(_)
            | ExprKind::String(_)
            | ExprKind::Block(_) => {}
        }
        expr.temporary = self.pool.get();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{cascade, equals, int, local, send, string};

    fn temp(position: usize) -> LexicalAddress {
        LexicalAddress::temporary(position)
    }

    #[test]
    fn pool_reuses_lowest_free_slot() {
        let mut pool = TemporaryPool::new(3);
        assert_eq!(pool.get(), temp(3));
        assert_eq!(pool.get(), temp(4));
        pool.release(temp(3));
        assert_eq!(pool.get(), temp(3));
        assert_eq!(pool.get(), temp(5));
        pool.release(LexicalAddress::NO_TEMPORARY);
        assert_eq!(pool.count(), 3);
    }

    #[test]
    fn identifiers_get_no_temporary() {
        let mut forest = SyntaxForest::new(vec![Stmt::expr(local(0, 1))]);
        let count = TemporaryAllocator::new(2).allocate(&mut forest);
        assert_eq!(count, 0);
        let Stmt::Expr(expr) = &forest.statements()[0] else {
            unreachable!()
        };
        assert!(!expr.temporary.is_temporary());
    }

    #[test]
    fn shared_subexpressions_get_distinct_live_slots() {
        // (a + b) == (a + b)
        let mut forest = SyntaxForest::new(vec![Stmt::expr(equals(
            send(local(0, 1), "+", vec![local(0, 2)]),
            send(local(0, 1), "+", vec![local(0, 2)]),
        ))]);
        let count = TemporaryAllocator::new(3).allocate(&mut forest);

        let Stmt::Expr(expr) = &forest.statements()[0] else {
            unreachable!()
        };
        let ExprKind::Equals(lhs, rhs) = &expr.kind else {
            unreachable!()
        };
        assert_eq!(lhs.temporary, temp(3));
        assert_eq!(rhs.temporary, temp(4));
        // both released before the comparison takes its own slot
        assert_eq!(expr.temporary, temp(3));
        assert_eq!(count, 2);
    }

    #[test]
    fn nested_operands_do_not_collide() {
        // (1 + 2) + (3 + 4)
        let mut forest = SyntaxForest::new(vec![Stmt::expr(send(
            send(int(1), "+", vec![int(2)]),
            "+",
            vec![send(int(3), "+", vec![int(4)])],
        ))]);
        let count = TemporaryAllocator::new(1).allocate(&mut forest);

        let Stmt::Expr(outer) = &forest.statements()[0] else {
            unreachable!()
        };
        let ExprKind::Send(outer_send) = &outer.kind else {
            unreachable!()
        };
        assert_eq!(outer_send.recipient.temporary, temp(1));
        assert_eq!(outer_send.params[0].temporary, temp(2));
        let ExprKind::Send(inner) = &outer_send.params[0].kind else {
            unreachable!()
        };
        // computed while the left operand is still held in slot 1
        assert_eq!(inner.recipient.temporary, temp(2));
        assert_eq!(inner.params[0].temporary, temp(3));
        assert_eq!(count, 3);
    }

    #[test]
    fn cascade_keeps_recipient_live() {
        // "x" foo; bar: 1
        let mut forest = SyntaxForest::new(vec![Stmt::expr(cascade(
            send(string("x"), "foo", vec![]),
            "bar:",
            vec![int(1)],
        ))]);
        TemporaryAllocator::new(1).allocate(&mut forest);

        let Stmt::Expr(expr) = &forest.statements()[0] else {
            unreachable!()
        };
        let ExprKind::CoalescedSend(coalesced) = &expr.kind else {
            unreachable!()
        };
        let recipient = coalesced.recipient().temporary;
        assert_eq!(recipient, temp(1));
        assert_eq!(coalesced.previous.temporary, temp(2));
        // the argument cannot land on the recipient's slot
        assert_ne!(coalesced.params[0].temporary, recipient);
    }
}
