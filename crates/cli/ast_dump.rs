//! Debug dump of the parsed AST (spec.md §6: "printed AST (optional
//! debug)"), an indented tree following the same per-node `Display`
//! impls `mc_ast` already provides for expressions and assignments.

use mc_ast::{Block, Decl, DeclKind, Display as _, Program, Stmt, StmtKind};
use mc_str::Interner;

pub fn dump(program: &Program, interner: &Interner) -> String {
    let mut out = String::new();
    for (i, block) in program.blocks.iter().enumerate() {
        out.push_str(&format!("block {}\n", i));
        dump_block(block, interner, 1, &mut out);
    }
    out
}

fn indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn dump_block(block: &Block, interner: &Interner, level: usize, out: &mut String) {
    for d in &block.decls {
        indent(level, out);
        out.push_str(&dump_decl(d, interner));
        out.push('\n');
    }
    for s in &block.stmts {
        dump_stmt(s, interner, level, out);
    }
}

fn dump_decl(d: &Decl, interner: &Interner) -> String {
    match &d.kind {
        DeclKind::Variable => format!("int {}", interner.lookup(d.name)),
        DeclKind::Array { size } => format!("int[{}] {}", size, interner.lookup(d.name)),
        DeclKind::Record => format!("{{int fst; int snd}} {}", interner.lookup(d.name)),
    }
}

fn dump_stmt(stmt: &Stmt, interner: &Interner, level: usize, out: &mut String) {
    indent(level, out);
    match &stmt.kind {
        StmtKind::Assignment(a) => out.push_str(&a.display(interner)),
        StmtKind::Call(c) => out.push_str(&c.display(interner)),
        StmtKind::If { cond, body } => {
            out.push_str(&format!("if ({})", cond.display(interner)));
            out.push('\n');
            for s in body {
                dump_stmt(s, interner, level + 1, out);
            }
            return;
        }
        StmtKind::IfElse {
            cond,
            then_body,
            else_body,
        } => {
            out.push_str(&format!("if ({})", cond.display(interner)));
            out.push('\n');
            for s in then_body {
                dump_stmt(s, interner, level + 1, out);
            }
            indent(level, out);
            out.push_str("else\n");
            for s in else_body {
                dump_stmt(s, interner, level + 1, out);
            }
            return;
        }
        StmtKind::While { cond, body } => {
            out.push_str(&format!("while ({})", cond.display(interner)));
            out.push('\n');
            for s in body {
                dump_stmt(s, interner, level + 1, out);
            }
            return;
        }
    }
    out.push('\n');
}
