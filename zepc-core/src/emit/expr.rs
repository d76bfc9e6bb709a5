use tracing::warn;

use crate::ast::{ArrayItem, Expr, ExprKind, NewTypeKind, Parameter, Stmt, UnaryOp};
use crate::builtins::{self, ReceiverKind};
use crate::error::CoreError;

use super::Emitter;
use super::writer::CodeWriter;

/// What the caller of an expression compilation expects back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExprContext<'t> {
    /// The value is consumed (assigned or returned).
    pub expect_return: bool,
    /// Variable the value is about to be stored into, if any.
    pub target: Option<&'t str>,
    /// Only a read of the value is needed.
    pub read_only: bool,
}

/// Rendered expression plus what the assignment compiler needs to know
/// about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledExpr {
    pub code: String,
    pub kind: &'static str,
    pub read_only: bool,
    /// The value can be written straight into the target without going
    /// through a temporary.
    pub direct_write: bool,
}

impl<'a> Emitter<'a> {
    /// Compiles `expr` under `context`. An empty rendering means the
    /// expression produced no value and is rejected.
    pub fn compile_expr(
        &mut self,
        expr: &Expr,
        context: &ExprContext<'_>,
    ) -> Result<CompiledExpr, CoreError> {
        let code = self.render_expr(expr)?;
        if context.expect_return && code.trim().is_empty() {
            return Err(CoreError::InvalidExpression {
                location: expr.location.clone(),
            });
        }
        let read_only = context.read_only
            || matches!(
                expr.kind,
                ExprKind::PropertyAccess { .. }
                    | ExprKind::ArrayAccess { .. }
                    | ExprKind::TypeHint { .. }
            );
        let direct_write = match context.target {
            Some(target) => !expr.reads_variable(target),
            None => false,
        };
        Ok(CompiledExpr {
            code,
            kind: expr.kind_name(),
            read_only,
            direct_write,
        })
    }

    pub fn render_expr(&mut self, expr: &Expr) -> Result<String, CoreError> {
        Ok(match &expr.kind {
            ExprKind::Int(value) | ExprKind::Double(value) | ExprKind::Constant(value) => {
                value.clone()
            }
            ExprKind::Bool(true) => "TRUE".to_string(),
            ExprKind::Bool(false) => "FALSE".to_string(),
            ExprKind::Null => "NULL".to_string(),
            ExprKind::String(value) => string_literal(value),
            ExprKind::IString(value) => format!("\"{value}\""),
            ExprKind::Char(value) => {
                if value.starts_with('\\') {
                    format!("\"{value}\"")
                } else {
                    format!("'{value}'")
                }
            }
            ExprKind::Array(items) => self.array(items)?,
            ExprKind::EmptyArray => "[]".to_string(),
            ExprKind::Variable(name) => format!("${name}"),
            ExprKind::Unary { op, operand } => self.unary(*op, operand)?,
            ExprKind::Binary { op, left, right } => {
                let left = self.render_expr(left)?;
                let right = self.render_expr(right)?;
                format!("{left} {} {right}", op.symbol())
            }
            ExprKind::Range {
                inclusive,
                start,
                end,
            } => {
                let start = self.render_expr(start)?;
                let end = self.render_expr(end)?;
                if *inclusive {
                    format!("range({start}, {end})")
                } else {
                    format!("array_slice(range({start}, {end}), 1, -1)")
                }
            }
            ExprKind::PropertyAccess { object, property } => {
                format!("{}->{property}", self.render_expr(object)?)
            }
            ExprKind::PropertyDynamicAccess { object, property } => {
                let object = self.render_expr(object)?;
                format!("{object}->{{{}}}", self.render_expr(property)?)
            }
            ExprKind::PropertyStringAccess { object, property } => {
                format!(
                    "zephir_read_property({}, '{property}')",
                    self.render_expr(object)?
                )
            }
            ExprKind::StaticPropertyAccess { class, property } => format!("{class}::${property}"),
            ExprKind::StaticConstantAccess { class, constant } => format!("{class}::{constant}"),
            ExprKind::ArrayAccess { array, index } => {
                let array = self.render_expr(array)?;
                format!("{array}[{}]", self.render_expr(index)?)
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => self.method_call(expr, receiver, method, args)?,
            ExprKind::FunctionCall { name, args } => {
                self.check_global_access(expr, name, args)?;
                format!("{name}({})", self.arguments(args)?.join(", "))
            }
            ExprKind::StaticCall {
                class,
                method,
                args,
            } => format!("{class}::{method}({})", self.arguments(args)?.join(", ")),
            ExprKind::New {
                class,
                dynamic,
                args,
            } => {
                let args = self.arguments(args)?.join(", ");
                if *dynamic {
                    format!("new ${class}({args})")
                } else {
                    format!("new {class}({args})")
                }
            }
            ExprKind::NewType { type_name } => match type_name {
                NewTypeKind::Array => "[]".to_string(),
                NewTypeKind::String => "''".to_string(),
            },
            ExprKind::Cast { expr, .. } | ExprKind::TypeHint { expr, .. } => {
                self.render_expr(expr)?
            }
            ExprKind::Ternary {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.render_expr(condition)?;
                let then = self.render_expr(then)?;
                format!("{condition} ? {then} : {}", self.render_expr(otherwise)?)
            }
            ExprKind::Closure { parameters, body } => self.closure(expr, parameters, body)?,
            ExprKind::ClosureArrow { parameter, body } => {
                let scope = self.enter_body(&[], false, &expr.location);
                self.symbols.declare(parameter, expr.location.clone());
                let rendered = self.render_expr(body);
                self.symbols = scope;
                format!("function (${parameter}) {{ return {}; }}", rendered?)
            }
            ExprKind::Fetch { expr, .. } => format!("isset({})", self.render_expr(expr)?),
        })
    }

    fn arguments(&mut self, args: &[Expr]) -> Result<Vec<String>, CoreError> {
        args.iter().map(|arg| self.render_expr(arg)).collect()
    }

    fn array(&mut self, items: &[ArrayItem]) -> Result<String, CoreError> {
        let mut rendered = Vec::with_capacity(items.len());
        for item in items {
            let value = self.render_expr(&item.value)?;
            match &item.key {
                Some(key) => rendered.push(format!("{} => {value}", self.render_expr(key)?)),
                None => rendered.push(value),
            }
        }
        Ok(format!("[{}]", rendered.join(", ")))
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<String, CoreError> {
        if op == UnaryOp::Isset {
            return self.isset(operand);
        }
        let inner = self.render_expr(operand)?;
        Ok(match op {
            UnaryOp::Not => format!("!{inner}"),
            UnaryOp::BitwiseNot => format!("~{inner}"),
            UnaryOp::Minus => format!("-{inner}"),
            UnaryOp::Plus => format!("+{inner}"),
            UnaryOp::Empty => format!("zephir_isempty({inner})"),
            UnaryOp::Typeof => format!("gettype({inner})"),
            UnaryOp::Require => format!("require {inner}"),
            UnaryOp::Clone => format!("clone {inner}"),
            UnaryOp::List => format!("({inner})"),
            UnaryOp::Likely | UnaryOp::Unlikely | UnaryOp::Isset => inner,
        })
    }

    /// Zephir `isset` also works on properties and array keys holding
    /// `null`, which the runtime helpers account for.
    fn isset(&mut self, operand: &Expr) -> Result<String, CoreError> {
        Ok(match &operand.kind {
            ExprKind::ArrayAccess { array, index } => {
                let array = self.render_expr(array)?;
                format!("zephir_isset_array({array}, {})", self.render_expr(index)?)
            }
            ExprKind::PropertyAccess { object, property }
            | ExprKind::PropertyStringAccess { object, property } => {
                format!(
                    "zephir_isset_property({}, '{property}')",
                    self.render_expr(object)?
                )
            }
            ExprKind::PropertyDynamicAccess { object, property } => {
                let object = self.render_expr(object)?;
                format!("zephir_isset_property({object}, {})", self.render_expr(property)?)
            }
            _ => format!("isset({})", self.render_expr(operand)?),
        })
    }

    fn method_call(
        &mut self,
        call: &Expr,
        receiver: &Expr,
        method: &str,
        args: &[Expr],
    ) -> Result<String, CoreError> {
        let kind = match receiver.kind {
            ExprKind::String(_) => Some(ReceiverKind::String),
            ExprKind::Array(_) | ExprKind::EmptyArray => Some(ReceiverKind::Array),
            _ => None,
        };
        let object = self.render_expr(receiver)?;
        let args = self.arguments(args)?;
        let Some(kind) = kind else {
            return Ok(format!("{object}->{method}({})", args.join(", ")));
        };
        let mapping = builtins::resolve(kind, method, &call.location)?;
        if mapping.in_place {
            warn!(
                method,
                function = mapping.function,
                location = %call.location,
                "in-place built-in applied to a literal, the result is discarded"
            );
        }
        let ordered = mapping.arrange(object, args);
        Ok(format!("{}({})", mapping.function, ordered.join(", ")))
    }

    /// `globals_get("name")` and `globals_set("name", v)` must name a
    /// declared global once the table is initialized.
    fn check_global_access(
        &self,
        call: &Expr,
        name: &str,
        args: &[Expr],
    ) -> Result<(), CoreError> {
        if !matches!(name, "globals_get" | "globals_set") || !self.globals.is_initialized() {
            return Ok(());
        }
        let Some(ExprKind::String(global)) = args.first().map(|arg| &arg.kind) else {
            return Ok(());
        };
        if self.globals.contains(global)? {
            Ok(())
        } else {
            Err(CoreError::UnknownGlobal {
                name: global.clone(),
                location: call.location.clone(),
            })
        }
    }

    /// Renders a closure as a multi-line fragment; the writer re-indents it
    /// when the enclosing line is flushed.
    fn closure(
        &mut self,
        closure: &Expr,
        parameters: &[Parameter],
        body: &[Stmt],
    ) -> Result<String, CoreError> {
        let params = self.parameters(parameters)?;
        let has_this = self.symbols.contains("this");
        let scope = self.enter_body(parameters, has_this, &closure.location);
        let outer = std::mem::replace(&mut self.writer, CodeWriter::new(self.config));
        self.writer.open_block(&format!("function ({params})"), false);
        let result = self.block(body);
        self.writer.close_block("");
        let inner = std::mem::replace(&mut self.writer, outer);
        self.symbols = scope;
        result?;
        Ok(inner.finish().trim_end().to_string())
    }
}

/// Double-quoted PHP string. Zephir strings do not interpolate, so `$` is
/// escaped; backslash escapes pass through unchanged.
fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut escaped = false;
    for ch in value.chars() {
        if ch == '$' && !escaped {
            out.push('\\');
        }
        escaped = ch == '\\' && !escaped;
        out.push(ch);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Stmt, StmtKind};
    use crate::config::EmitterConfig;
    use crate::error::Location;
    use crate::globals::ExtensionGlobals;

    fn render_with(expr: &Expr, globals: &ExtensionGlobals) -> Result<String, CoreError> {
        let config = EmitterConfig::default();
        let mut emitter = Emitter::new(&config, globals);
        emitter.render_expr(expr)
    }

    fn render(expr: &Expr) -> String {
        render_with(expr, &ExtensionGlobals::new()).expect("render")
    }

    fn e(kind: ExprKind) -> Expr {
        Expr::new(kind)
    }

    fn int(value: &str) -> Expr {
        e(ExprKind::Int(value.to_string()))
    }

    fn string(value: &str) -> Expr {
        e(ExprKind::String(value.to_string()))
    }

    fn mcall(receiver: Expr, method: &str, args: Vec<Expr>) -> Expr {
        e(ExprKind::MethodCall {
            receiver: Box::new(receiver),
            method: method.to_string(),
            args,
        })
    }

    #[test]
    fn renders_ranges() {
        let range = |inclusive| {
            e(ExprKind::Range {
                inclusive,
                start: Box::new(int("1")),
                end: Box::new(int("10")),
            })
        };
        assert_eq!(render(&range(true)), "range(1, 10)");
        assert_eq!(render(&range(false)), "array_slice(range(1, 10), 1, -1)");
    }

    #[test]
    fn maps_string_pseudo_methods() {
        assert_eq!(render(&mcall(string("abc"), "length", vec![])), "strlen(\"abc\")");
        assert_eq!(
            render(&mcall(string("abc"), "index", vec![string("b")])),
            "strpos(\"abc\", \"b\")"
        );
        assert_eq!(render(&mcall(string(" a "), "trimLeft", vec![])), "ltrim(\" a \")");
        assert_eq!(
            render(&mcall(string("<b>"), "htmlSpecialChars", vec![])),
            "htmlspecialchars(\"<b>\")"
        );
    }

    #[test]
    fn maps_array_pseudo_methods_with_reordering() {
        let list = e(ExprKind::Array(vec![
            ArrayItem {
                key: None,
                value: int("1"),
            },
            ArrayItem {
                key: None,
                value: int("2"),
            },
        ]));
        assert_eq!(
            render(&mcall(list.clone(), "join", vec![string(",")])),
            "implode(\",\", [1, 2])"
        );
        assert_eq!(
            render(&mcall(list, "map", vec![e(ExprKind::Variable("fn".into()))])),
            "array_map($fn, [1, 2])"
        );
        let one = e(ExprKind::Array(vec![ArrayItem {
            key: None,
            value: int("1"),
        }]));
        assert_eq!(render(&mcall(one, "toJson", vec![])), "json_encode([1])");
    }

    #[test]
    fn unknown_pseudo_method_fails() {
        let call = Expr::at(
            ExprKind::MethodCall {
                receiver: Box::new(string("abc")),
                method: "explode".into(),
                args: Vec::new(),
            },
            Location {
                file: Some("s.zep".into()),
                line: Some(4),
                column: Some(9),
            },
        );
        let err = render_with(&call, &ExtensionGlobals::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "method [explode] does not exist for [string] receiver type at s.zep:4:9"
        );
    }

    #[test]
    fn variable_receivers_stay_method_calls() {
        let call = mcall(e(ExprKind::Variable("this".into())), "run", vec![int("1")]);
        assert_eq!(render(&call), "$this->run(1)");
    }

    #[test]
    fn renders_isset_forms() {
        let isset = |operand| {
            e(ExprKind::Unary {
                op: UnaryOp::Isset,
                operand: Box::new(operand),
            })
        };
        let array = e(ExprKind::ArrayAccess {
            array: Box::new(Expr::variable("a")),
            index: Box::new(string("k")),
        });
        let property = e(ExprKind::PropertyAccess {
            object: Box::new(Expr::variable("this")),
            property: "name".into(),
        });
        assert_eq!(render(&isset(array)), "zephir_isset_array($a, \"k\")");
        assert_eq!(render(&isset(property)), "zephir_isset_property($this, 'name')");
        assert_eq!(render(&isset(Expr::variable("v"))), "isset($v)");
    }

    #[test]
    fn renders_scalars_and_operators() {
        assert_eq!(render(&e(ExprKind::Bool(true))), "TRUE");
        assert_eq!(render(&e(ExprKind::Null)), "NULL");
        assert_eq!(render(&string("cost: $5")), "\"cost: \\$5\"");
        let sum = e(ExprKind::Unary {
            op: UnaryOp::List,
            operand: Box::new(e(ExprKind::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expr::variable("a")),
                right: Box::new(int("1")),
            })),
        });
        assert_eq!(render(&sum), "($a + 1)");
        let typed = e(ExprKind::Unary {
            op: UnaryOp::Typeof,
            operand: Box::new(Expr::variable("a")),
        });
        assert_eq!(render(&typed), "gettype($a)");
    }

    #[test]
    fn fetch_outside_if_is_isset() {
        let fetch = e(ExprKind::Fetch {
            variable: "v".into(),
            expr: Box::new(e(ExprKind::PropertyAccess {
                object: Box::new(Expr::variable("o")),
                property: "p".into(),
            })),
        });
        assert_eq!(render(&fetch), "isset($o->p)");
    }

    #[test]
    fn renders_closures_as_fragments() {
        let closure = e(ExprKind::Closure {
            parameters: vec![Parameter {
                name: "x".into(),
                default: None,
                reference: false,
            }],
            body: vec![Stmt {
                kind: StmtKind::Return(Some(Expr::variable("x"))),
                location: Location::default(),
            }],
        });
        assert_eq!(render(&closure), "function ($x) {\n  return $x;\n}");
    }

    #[test]
    fn checks_declared_globals() {
        let globals = ExtensionGlobals::initialized([("db.host", "localhost")]);
        let call = |name: &str| {
            e(ExprKind::FunctionCall {
                name: "globals_get".into(),
                args: vec![string(name)],
            })
        };
        assert_eq!(
            render_with(&call("db.host"), &globals).unwrap(),
            "globals_get(\"db.host\")"
        );
        assert!(matches!(
            render_with(&call("db.port"), &globals),
            Err(CoreError::UnknownGlobal { .. })
        ));
        assert!(render_with(&call("db.port"), &ExtensionGlobals::new()).is_ok());
    }

    #[test]
    fn self_reference_blocks_direct_write() {
        let config = EmitterConfig::default();
        let globals = ExtensionGlobals::new();
        let mut emitter = Emitter::new(&config, &globals);
        let context = ExprContext {
            expect_return: true,
            target: Some("a"),
            read_only: false,
        };
        let own = e(ExprKind::Binary {
            op: BinaryOp::Add,
            left: Box::new(Expr::variable("a")),
            right: Box::new(int("1")),
        });
        assert!(!emitter.compile_expr(&own, &context).unwrap().direct_write);
        let other = e(ExprKind::Binary {
            op: BinaryOp::Add,
            left: Box::new(Expr::variable("b")),
            right: Box::new(int("1")),
        });
        assert!(emitter.compile_expr(&other, &context).unwrap().direct_write);
        let access = e(ExprKind::ArrayAccess {
            array: Box::new(Expr::variable("b")),
            index: Box::new(int("0")),
        });
        let compiled = emitter.compile_expr(&access, &context).unwrap();
        assert!(compiled.read_only);
        assert!(compiled.direct_write);

        let own_element = e(ExprKind::ArrayAccess {
            array: Box::new(Expr::variable("a")),
            index: Box::new(int("0")),
        });
        let compiled = emitter.compile_expr(&own_element, &context).unwrap();
        assert!(compiled.read_only);
        assert!(!compiled.direct_write);
    }
}
