//! A small atom selection language.
//!
//! Terms:
//! - `all`, `*`, empty string: every atom
//! - `hetero`, `polymer` (alias `protein`), `water`, `backbone`
//! - `/N`: model N (structures here carry a single model, so `/0` is all)
//! - `RESNO[:CHAIN][.ATOM]`, `:CHAIN[.ATOM]`, `.ATOM`, e.g. `1.CA`,
//!   `10:A.CB`
//!
//! Terms combine with `not`, `and`, `or` and parentheses; `and` binds
//! tighter than `or`.

use super::structure::Structure;

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    All,
    Nothing,
    Hetero,
    Water,
    Backbone,
    Model(u32),
    Atom {
        resno: Option<i32>,
        chain: Option<String>,
        atom: Option<String>,
    },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// A parsed selection string.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    string: String,
    expr: Expr,
}

impl Selection {
    /// Parse a selection. Malformed input selects nothing and logs a
    /// warning.
    #[must_use]
    pub fn new(string: &str) -> Self {
        let tokens = tokenize(string);
        let expr = if tokens.is_empty() {
            Expr::All
        } else {
            let mut parser = Parser { tokens, pos: 0 };
            match parser.or_expr() {
                Some(expr) if parser.pos == parser.tokens.len() => expr,
                _ => {
                    log::warn!("invalid selection '{string}', matching nothing");
                    Expr::Nothing
                }
            }
        };
        Self {
            string: string.to_owned(),
            expr,
        }
    }

    /// Selection matching every atom.
    #[must_use]
    pub fn all() -> Self {
        Self::new("")
    }

    /// The original selection string.
    #[must_use]
    pub fn string(&self) -> &str {
        &self.string
    }

    /// Whether this selection matches every atom unconditionally.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.expr == Expr::All
    }

    /// Test a single atom of `structure`.
    #[must_use]
    pub fn matches(&self, structure: &Structure, index: usize) -> bool {
        eval(&self.expr, structure, index)
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::all()
    }
}

fn eval(expr: &Expr, s: &Structure, i: usize) -> bool {
    match expr {
        Expr::All | Expr::Model(0) => true,
        Expr::Nothing | Expr::Model(_) => false,
        Expr::Hetero => s.is_hetero(i),
        Expr::Water => matches!(s.resname(i), "HOH" | "WAT" | "H2O" | "SOL"),
        Expr::Backbone => matches!(s.atom_name(i), "N" | "CA" | "C" | "O"),
        Expr::Atom { resno, chain, atom } => {
            resno.is_none_or(|r| s.resno(i) == r)
                && chain.as_deref().is_none_or(|c| s.chain(i) == c)
                && atom
                    .as_deref()
                    .is_none_or(|a| s.atom_name(i).eq_ignore_ascii_case(a))
        }
        Expr::Not(inner) => !eval(inner, s, i),
        Expr::And(a, b) => eval(a, s, i) && eval(b, s, i),
        Expr::Or(a, b) => eval(a, s, i) || eval(b, s, i),
    }
}

fn tokenize(string: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in string.chars() {
        if c.is_whitespace() || c == '(' || c == ')' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            if !c.is_whitespace() {
                tokens.push(c.to_string());
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

struct Parser {
    tokens: Vec<String>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn next(&mut self) -> Option<String> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn or_expr(&mut self) -> Option<Expr> {
        let mut lhs = self.and_expr()?;
        while self.peek().is_some_and(|t| t.eq_ignore_ascii_case("or")) {
            self.pos += 1;
            let rhs = self.and_expr()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Some(lhs)
    }

    fn and_expr(&mut self) -> Option<Expr> {
        let mut lhs = self.not_expr()?;
        while self.peek().is_some_and(|t| t.eq_ignore_ascii_case("and")) {
            self.pos += 1;
            let rhs = self.not_expr()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Some(lhs)
    }

    fn not_expr(&mut self) -> Option<Expr> {
        if self.peek().is_some_and(|t| t.eq_ignore_ascii_case("not")) {
            self.pos += 1;
            return Some(Expr::Not(Box::new(self.not_expr()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Option<Expr> {
        let token = self.next()?;
        if token == "(" {
            let inner = self.or_expr()?;
            return (self.next().as_deref() == Some(")")).then_some(inner);
        }
        parse_term(&token)
    }
}

fn parse_term(token: &str) -> Option<Expr> {
    match token.to_ascii_lowercase().as_str() {
        "all" | "*" => return Some(Expr::All),
        "hetero" => return Some(Expr::Hetero),
        "polymer" | "protein" => {
            return Some(Expr::Not(Box::new(Expr::Hetero)));
        }
        "water" => return Some(Expr::Water),
        "backbone" => return Some(Expr::Backbone),
        _ => {}
    }
    if let Some(model) = token.strip_prefix('/') {
        return model.parse().ok().map(Expr::Model);
    }

    let (head, atom) = match token.split_once('.') {
        Some((head, atom)) if !atom.is_empty() => (head, Some(atom.to_owned())),
        Some(_) => return None,
        None => (token, None),
    };
    let (resno, chain) = match head.split_once(':') {
        Some((resno, chain)) if !chain.is_empty() => (resno, Some(chain.to_owned())),
        Some(_) => return None,
        None => (head, None),
    };
    let resno = if resno.is_empty() {
        None
    } else {
        Some(resno.parse::<i32>().ok()?)
    };
    if resno.is_none() && chain.is_none() && atom.is_none() {
        return None;
    }
    Some(Expr::Atom { resno, chain, atom })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    fn picked(sele: &str) -> Vec<usize> {
        let s = fixtures::peptide(10);
        s.atom_indices(&Selection::new(sele))
    }

    #[test]
    fn residue_and_atom_name() {
        // fixture: residue i has atoms N, CA, C in that order
        assert_eq!(picked("1.CA"), vec![1]);
        assert_eq!(picked("4.CA"), vec![10]);
        assert_eq!(picked("4"), vec![9, 10, 11]);
    }

    #[test]
    fn unknown_residue_matches_nothing() {
        assert!(picked("99.CA").is_empty());
    }

    #[test]
    fn boolean_combinations() {
        assert_eq!(picked("1.CA or 2.CA"), vec![1, 4]);
        assert_eq!(picked("1 and not .CA"), vec![0, 2]);
        assert_eq!(picked("(1 or 2) and .N"), vec![0, 3]);
    }

    #[test]
    fn empty_and_all_select_everything() {
        assert_eq!(picked("").len(), 30);
        assert_eq!(picked("*").len(), 30);
        assert_eq!(picked("/0").len(), 30);
        assert!(Selection::new("").is_all());
    }

    #[test]
    fn malformed_selection_matches_nothing() {
        assert!(picked("1.").is_empty());
        assert!(picked("(1").is_empty());
        assert!(picked("abc").is_empty());
    }

    #[test]
    fn hetero_keyword() {
        let s = fixtures::peptide_with_ligand(3);
        let hetero = s.atom_indices(&Selection::new("hetero"));
        assert_eq!(hetero, vec![9, 10]);
        assert_eq!(s.atom_indices(&Selection::new("polymer")).len(), 9);
    }
}
