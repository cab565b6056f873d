//! Replacement body construction
//!
//! Builds, as SWC nodes, the block that replaces a matching function's body:
//!
//! ```text
//! {
//!     const FN = async cb => BODY;
//!     return new Promise((RESOLVE, REJECT) => {
//!         const _cb = function (err, ...args) {
//!             if (typeof cb === 'function') {
//!                 cb(err, ...args);
//!             }
//!             if (err) {
//!                 REJECT(err);
//!             } else {
//!                 RESOLVE(...args);
//!             }
//!         };
//!         _cb.resolve = _cb.bind(null, null);
//!         _cb.reject = _cb;
//!         FN(_cb).catch(_cb);
//!     });
//! }
//! ```
//!
//! The original body is moved into the inner arrow untouched. Its uses of
//! `cb` bind to the arrow's own parameter. A throw or rejected `await` in the
//! body settles through `_cb` like an explicit `cb(err)`.

use crate::ast::HelperNames;
use crate::matcher::CallbackConvention;
use swc_common::{SyntaxContext, DUMMY_SP};
use swc_ecma_ast::*;

const ERR_PARAM: &str = "err";
const ARGS_PARAM: &str = "args";
const PROMISE: &str = "Promise";

/// Free names the replacement body relies on besides the callback itself
///
/// A callback parameter with one of these names would shadow or be shadowed
/// by the generated code.
pub const FIXED_NAMES: &[&str] = &[ERR_PARAM, ARGS_PARAM, PROMISE];

/// Expand the replacement body around `body`
///
/// `is_async` is carried onto the inner function so suspension points in the
/// moved body stay valid. `callback_type` is the annotation of the original
/// callback parameter, copied onto the inner one.
pub fn expand(
    body: BlockStmtOrExpr,
    names: &HelperNames,
    convention: &CallbackConvention,
    is_async: bool,
    callback_type: Option<Box<TsTypeAnn>>,
) -> BlockStmt {
    let callback = convention.name();
    let wrapped = names.wrapped_callback.as_str();

    let inner_fn = Expr::Arrow(ArrowExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        params: vec![Pat::Ident(BindingIdent {
            id: ident(callback),
            type_ann: callback_type,
        })],
        body: Box::new(body),
        is_async,
        is_generator: false,
        type_params: None,
        return_type: None,
    });

    // FN(_cb).catch(_cb)
    let run_inner = expr_stmt(call(
        member(
            call(ident_expr(&names.inner_fn), vec![arg(ident_expr(wrapped))]),
            "catch",
        ),
        vec![arg(ident_expr(wrapped))],
    ));

    let mut executor_body = wrapped_callback(callback, wrapped, names);
    executor_body.push(run_inner);

    let executor = arrow_block(
        vec![binding(&names.resolve), binding(&names.reject)],
        executor_body,
    );

    let promise = Expr::New(NewExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        callee: Box::new(ident_expr(PROMISE)),
        args: Some(vec![arg(executor)]),
        type_args: None,
    });

    BlockStmt {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        stmts: vec![
            const_decl(&names.inner_fn, inner_fn),
            Stmt::Return(ReturnStmt {
                span: DUMMY_SP,
                arg: Some(Box::new(promise)),
            }),
        ],
    }
}

/// `const _cb = function (err, ...args) {...}; _cb.resolve = ...; _cb.reject = _cb;`
fn wrapped_callback(callback: &str, wrapped: &str, names: &HelperNames) -> Vec<Stmt> {
    let forward_to_user = if_stmt(
        Expr::Bin(BinExpr {
            span: DUMMY_SP,
            op: BinaryOp::EqEqEq,
            left: Box::new(Expr::Unary(UnaryExpr {
                span: DUMMY_SP,
                op: UnaryOp::TypeOf,
                arg: Box::new(ident_expr(callback)),
            })),
            right: Box::new(str_lit("function")),
        }),
        vec![expr_stmt(call(ident_expr(callback), error_and_args()))],
        None,
    );

    let settle = if_stmt(
        ident_expr(ERR_PARAM),
        vec![expr_stmt(call(
            ident_expr(&names.reject),
            vec![arg(ident_expr(ERR_PARAM))],
        ))],
        Some(vec![expr_stmt(call(
            ident_expr(&names.resolve),
            vec![spread(ident_expr(ARGS_PARAM))],
        ))]),
    );

    let wrapped_fn = Expr::Fn(FnExpr {
        ident: None,
        function: Box::new(Function {
            params: vec![
                param(binding(ERR_PARAM)),
                param(Pat::Rest(RestPat {
                    span: DUMMY_SP,
                    dot3_token: DUMMY_SP,
                    arg: Box::new(binding(ARGS_PARAM)),
                    type_ann: None,
                })),
            ],
            decorators: vec![],
            span: DUMMY_SP,
            ctxt: SyntaxContext::empty(),
            body: Some(block(vec![forward_to_user, settle])),
            is_generator: false,
            is_async: false,
            type_params: None,
            return_type: None,
        }),
    });

    // _cb.resolve = _cb.bind(null, null)
    let bind_resolve = assign_member(
        wrapped,
        "resolve",
        call(
            member(ident_expr(wrapped), "bind"),
            vec![arg(null_lit()), arg(null_lit())],
        ),
    );
    let alias_reject = assign_member(wrapped, "reject", ident_expr(wrapped));

    vec![const_decl(wrapped, wrapped_fn), bind_resolve, alias_reject]
}

fn error_and_args() -> Vec<ExprOrSpread> {
    vec![arg(ident_expr(ERR_PARAM)), spread(ident_expr(ARGS_PARAM))]
}

fn ident(name: &str) -> Ident {
    Ident::new(name.into(), DUMMY_SP, SyntaxContext::empty())
}

fn ident_expr(name: &str) -> Expr {
    Expr::Ident(ident(name))
}

fn binding(name: &str) -> Pat {
    Pat::Ident(BindingIdent {
        id: ident(name),
        type_ann: None,
    })
}

fn param(pat: Pat) -> Param {
    Param {
        span: DUMMY_SP,
        decorators: vec![],
        pat,
    }
}

fn arg(expr: Expr) -> ExprOrSpread {
    ExprOrSpread {
        spread: None,
        expr: Box::new(expr),
    }
}

fn spread(expr: Expr) -> ExprOrSpread {
    ExprOrSpread {
        spread: Some(DUMMY_SP),
        expr: Box::new(expr),
    }
}

fn call(callee: Expr, args: Vec<ExprOrSpread>) -> Expr {
    Expr::Call(CallExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        callee: Callee::Expr(Box::new(callee)),
        args,
        type_args: None,
    })
}

fn member(obj: Expr, prop: &str) -> Expr {
    Expr::Member(member_expr(obj, prop))
}

fn member_expr(obj: Expr, prop: &str) -> MemberExpr {
    MemberExpr {
        span: DUMMY_SP,
        obj: Box::new(obj),
        prop: MemberProp::Ident(IdentName::new(prop.into(), DUMMY_SP)),
    }
}

fn assign_member(obj: &str, prop: &str, value: Expr) -> Stmt {
    expr_stmt(Expr::Assign(AssignExpr {
        span: DUMMY_SP,
        op: AssignOp::Assign,
        left: AssignTarget::Simple(SimpleAssignTarget::Member(member_expr(
            ident_expr(obj),
            prop,
        ))),
        right: Box::new(value),
    }))
}

fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr(ExprStmt {
        span: DUMMY_SP,
        expr: Box::new(expr),
    })
}

fn const_decl(name: &str, init: Expr) -> Stmt {
    Stmt::Decl(Decl::Var(Box::new(VarDecl {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        kind: VarDeclKind::Const,
        declare: false,
        decls: vec![VarDeclarator {
            span: DUMMY_SP,
            name: binding(name),
            init: Some(Box::new(init)),
            definite: false,
        }],
    })))
}

fn block(stmts: Vec<Stmt>) -> BlockStmt {
    BlockStmt {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        stmts,
    }
}

fn if_stmt(test: Expr, cons: Vec<Stmt>, alt: Option<Vec<Stmt>>) -> Stmt {
    Stmt::If(IfStmt {
        span: DUMMY_SP,
        test: Box::new(test),
        cons: Box::new(Stmt::Block(block(cons))),
        alt: alt.map(|stmts| Box::new(Stmt::Block(block(stmts)))),
    })
}

fn arrow_block(params: Vec<Pat>, stmts: Vec<Stmt>) -> Expr {
    Expr::Arrow(ArrowExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        params,
        body: Box::new(BlockStmtOrExpr::BlockStmt(block(stmts))),
        is_async: false,
        is_generator: false,
        type_params: None,
        return_type: None,
    })
}

fn str_lit(value: &str) -> Expr {
    Expr::Lit(Lit::Str(Str {
        span: DUMMY_SP,
        value: value.into(),
        raw: None,
    }))
}

fn null_lit() -> Expr {
    Expr::Lit(Lit::Null(Null { span: DUMMY_SP }))
}
