use crate::loc::Loc;

/// A name with its location: variable reads, declaration targets, and the
/// synthetic operator names of desugared calls (`"+"`, `"unary -"`, ...).
#[derive(Debug, Clone)]
pub struct Name {
    pub text: String,
    pub loc: Loc,
}

/// Expressions form a tree owned top-down; every variant carries its span.
/// `Missing` stands in wherever material could not be parsed, so parents
/// always have total children.
#[derive(Debug, Clone)]
pub enum Expr {
    Missing {
        loc: Loc,
    },
    True {
        loc: Loc,
    },
    False {
        loc: Loc,
    },
    Int {
        value: i128,
        loc: Loc,
    },
    Float {
        value: f64,
        loc: Loc,
    },
    String {
        opening: Loc,
        content: Loc,
        closing: Loc,
        interpreted: String,
        loc: Loc,
    },
    VariableRead {
        name: Name,
    },
    Group {
        opening: Loc,
        body: Box<Expr>,
        closing: Loc,
        loc: Loc,
    },
    Block {
        opening: Loc,
        stmts: Stmts,
        closing: Loc,
        loc: Loc,
    },
    If {
        kw_if: Loc,
        predicate: Box<Expr>,
        /// The location of the `?` when this is the ternary form.
        ternary_then: Option<Loc>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
        loc: Loc,
    },
    Else {
        kw_else: Loc,
        body: Box<Expr>,
        loc: Loc,
    },
    And {
        left: Box<Expr>,
        op: Loc,
        right: Box<Expr>,
        loc: Loc,
    },
    Or {
        left: Box<Expr>,
        op: Loc,
        right: Box<Expr>,
        loc: Loc,
    },
    /// Method calls, and the desugared form of every binary operator except
    /// `&&`/`||` (one argument) and of the unary operators (no argument
    /// list).
    Call {
        receiver: Box<Expr>,
        function: Name,
        arguments: Option<Arguments>,
        loc: Loc,
    },
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expr {
        expr: Expr,
    },
    VariableDecl {
        kw_let: Loc,
        name: Name,
        eq: Loc,
        value: Expr,
        loc: Loc,
    },
}

#[derive(Debug, Clone)]
pub struct Stmts {
    pub items: Vec<Stmt>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct Arguments {
    pub items: Vec<Expr>,
    pub loc: Loc,
}

/// The root of a parse: one statement list spanning the whole source.
#[derive(Debug, Clone)]
pub struct Script {
    pub stmts: Stmts,
    pub loc: Loc,
}

pub fn expr_loc(expr: &Expr) -> Loc {
    match expr {
        Expr::Missing { loc }
        | Expr::True { loc }
        | Expr::False { loc }
        | Expr::Int { loc, .. }
        | Expr::Float { loc, .. }
        | Expr::String { loc, .. }
        | Expr::Group { loc, .. }
        | Expr::Block { loc, .. }
        | Expr::If { loc, .. }
        | Expr::Else { loc, .. }
        | Expr::And { loc, .. }
        | Expr::Or { loc, .. }
        | Expr::Call { loc, .. } => *loc,
        Expr::VariableRead { name } => name.loc,
    }
}

pub fn stmt_loc(stmt: &Stmt) -> Loc {
    match stmt {
        Stmt::Expr { expr } => expr_loc(expr),
        Stmt::VariableDecl { loc, .. } => *loc,
    }
}
