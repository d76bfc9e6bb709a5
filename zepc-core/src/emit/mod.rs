//! PHP emission from the typed AST.
//!
//! [`Emitter`] walks a [`Program`] and writes PHP through a [`CodeWriter`].
//! Structure (classes, methods, statements) lives here, expressions in
//! [`expr`] and `let` targets in [`assign`].

pub mod assign;
pub mod expr;
pub mod writer;

use crate::ast::{
    Catch, ClassDef, Clause, Constant, ElseIf, Expr, ExprKind, FunctionDef, InterfaceDef, Method,
    Parameter, Program, Property, Stmt, StmtKind, TopLevel, UseAlias,
};
use crate::config::EmitterConfig;
use crate::error::{CoreError, Location};
use crate::globals::ExtensionGlobals;
use crate::symbols::SymbolTable;

pub use assign::{CompiledAssignment, LetCompiler};
pub use expr::{CompiledExpr, ExprContext};
pub use writer::CodeWriter;

/// Modifiers PHP understands; Zephir-only ones (`internal`, `inline`,
/// `scoped`, `deprecated`) are dropped.
const PHP_MODIFIERS: &[&str] = &["abstract", "final", "public", "protected", "private", "static"];

pub struct Emitter<'a> {
    config: &'a EmitterConfig,
    globals: &'a ExtensionGlobals,
    writer: CodeWriter,
    symbols: SymbolTable,
}

/// Renders a whole program as a PHP file.
pub fn emit_program(
    program: &Program,
    config: &EmitterConfig,
    globals: &ExtensionGlobals,
) -> Result<String, CoreError> {
    let mut emitter = Emitter::new(config, globals);
    emitter.program(program)?;
    Ok(emitter.finish())
}

impl<'a> Emitter<'a> {
    pub fn new(config: &'a EmitterConfig, globals: &'a ExtensionGlobals) -> Self {
        Emitter {
            config,
            globals,
            writer: CodeWriter::new(config),
            symbols: SymbolTable::new(),
        }
    }

    pub fn finish(self) -> String {
        self.writer.finish()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn program(&mut self, program: &Program) -> Result<(), CoreError> {
        self.writer.line("<?php");
        self.writer.blank_line();
        for entry in &program.entries {
            self.top_level(entry)?;
        }
        Ok(())
    }

    fn top_level(&mut self, entry: &TopLevel) -> Result<(), CoreError> {
        match entry {
            TopLevel::Comment(comment) => self.comment(&comment.text),
            TopLevel::Namespace { name, .. } => {
                self.writer.line(&format!("namespace {name};"));
                self.writer.blank_line();
            }
            TopLevel::Use { aliases, .. } => self.use_statement(aliases),
            TopLevel::Class(class) => {
                self.class(class)?;
                self.writer.blank_line();
            }
            TopLevel::Interface(interface) => {
                self.interface(interface)?;
                self.writer.blank_line();
            }
            TopLevel::Function(function) => {
                self.function(function)?;
                self.writer.blank_line();
            }
            TopLevel::Statement(stmt) => self.statement(stmt)?,
        }
        Ok(())
    }

    fn comment(&mut self, text: &str) {
        self.writer.lines(&format!("/{text}/"));
    }

    fn use_statement(&mut self, aliases: &[UseAlias]) {
        for alias in aliases {
            match &alias.alias {
                Some(short) => self.writer.line(&format!("use {} as {short};", alias.name)),
                None => self.writer.line(&format!("use {};", alias.name)),
            }
        }
    }

    fn class(&mut self, class: &ClassDef) -> Result<(), CoreError> {
        if let Some(doc) = &class.docblock {
            self.comment(doc);
        }
        let mut header = String::new();
        if class.is_final {
            header.push_str("final ");
        } else if class.is_abstract {
            header.push_str("abstract ");
        }
        header.push_str("class ");
        header.push_str(&class.name);
        if let Some(parent) = &class.extends {
            header.push_str(" extends ");
            header.push_str(parent);
        }
        if !class.implements.is_empty() {
            header.push_str(" implements ");
            header.push_str(&class.implements.join(", "));
        }
        self.writer.open_block(&header, self.config.brace_on_new_line);
        self.members(&class.constants, &class.properties, &class.methods, false)?;
        self.writer.close_block("");
        Ok(())
    }

    fn interface(&mut self, interface: &InterfaceDef) -> Result<(), CoreError> {
        if let Some(doc) = &interface.docblock {
            self.comment(doc);
        }
        let mut header = format!("interface {}", interface.name);
        if !interface.extends.is_empty() {
            header.push_str(" extends ");
            header.push_str(&interface.extends.join(", "));
        }
        self.writer.open_block(&header, self.config.brace_on_new_line);
        self.members(&interface.constants, &[], &interface.methods, true)?;
        self.writer.close_block("");
        Ok(())
    }

    /// Class body sections, always in the order constants, properties, methods.
    fn members(
        &mut self,
        constants: &[Constant],
        properties: &[Property],
        methods: &[Method],
        interface: bool,
    ) -> Result<(), CoreError> {
        for constant in constants {
            self.constant(constant)?;
        }
        if !constants.is_empty() && !(properties.is_empty() && methods.is_empty()) {
            self.writer.blank_line();
        }
        for property in properties {
            self.property(property)?;
        }
        if !properties.is_empty() && !methods.is_empty() {
            self.writer.blank_line();
        }
        for (index, method) in methods.iter().enumerate() {
            if index > 0 {
                self.writer.blank_line();
            }
            self.method(method, interface)?;
        }
        Ok(())
    }

    fn constant(&mut self, constant: &Constant) -> Result<(), CoreError> {
        if let Some(doc) = &constant.docblock {
            self.comment(doc);
        }
        let value = self.render_expr(&constant.default)?;
        self.writer
            .line(&format!("const {} = {value};", constant.name));
        Ok(())
    }

    fn property(&mut self, property: &Property) -> Result<(), CoreError> {
        if let Some(doc) = &property.docblock {
            self.comment(doc);
        }
        let mut modifiers = modifiers(&property.visibility, false);
        if modifiers.is_empty() {
            modifiers.push_str("public");
        }
        match &property.default {
            Some(default) => {
                let value = self.render_expr(default)?;
                self.writer
                    .line(&format!("{modifiers} ${} = {value};", property.name));
            }
            None => self.writer.line(&format!("{modifiers} ${};", property.name)),
        }
        Ok(())
    }

    fn method(&mut self, method: &Method, interface: bool) -> Result<(), CoreError> {
        if let Some(doc) = &method.docblock {
            self.comment(doc);
        }
        let scope = self.enter_body(&method.parameters, !method.is_static(), &method.location);
        let result = self.method_body(method, interface);
        self.symbols = scope;
        result
    }

    fn method_body(&mut self, method: &Method, interface: bool) -> Result<(), CoreError> {
        let params = self.parameters(&method.parameters)?;
        let modifiers = modifiers(&method.visibility, !interface);
        let header = if modifiers.is_empty() {
            format!("function {}({params})", method.name)
        } else {
            format!("{modifiers} function {}({params})", method.name)
        };
        let is_abstract = method.visibility.iter().any(|v| v == "abstract");
        match &method.statements {
            None if interface || is_abstract => self.writer.line(&format!("{header};")),
            statements => {
                self.writer.open_block(&header, self.config.brace_on_new_line);
                if let Some(statements) = statements {
                    self.block(statements)?;
                }
                self.writer.close_block("");
            }
        }
        Ok(())
    }

    fn function(&mut self, function: &FunctionDef) -> Result<(), CoreError> {
        if let Some(doc) = &function.docblock {
            self.comment(doc);
        }
        let scope = self.enter_body(&function.parameters, false, &function.location);
        let result = self.function_body(function);
        self.symbols = scope;
        result
    }

    fn function_body(&mut self, function: &FunctionDef) -> Result<(), CoreError> {
        let params = self.parameters(&function.parameters)?;
        self.writer.open_block(
            &format!("function {}({params})", function.name),
            self.config.brace_on_new_line,
        );
        self.block(&function.statements)?;
        self.writer.close_block("");
        Ok(())
    }

    /// Starts a fresh symbol table for a body and returns the enclosing one.
    pub(crate) fn enter_body(
        &mut self,
        parameters: &[Parameter],
        has_this: bool,
        location: &Location,
    ) -> SymbolTable {
        let mut table = SymbolTable::new();
        if has_this {
            table.declare("this", location.clone());
        }
        for parameter in parameters {
            table.declare(&parameter.name, location.clone());
        }
        std::mem::replace(&mut self.symbols, table)
    }

    pub(crate) fn parameters(&mut self, parameters: &[Parameter]) -> Result<String, CoreError> {
        let mut rendered = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            let reference = if parameter.reference { "&" } else { "" };
            match &parameter.default {
                Some(default) => {
                    let value = self.render_expr(default)?;
                    rendered.push(format!("{reference}${} = {value}", parameter.name));
                }
                None => rendered.push(format!("{reference}${}", parameter.name)),
            }
        }
        Ok(rendered.join(", "))
    }

    pub(crate) fn block(&mut self, statements: &[Stmt]) -> Result<(), CoreError> {
        for stmt in statements {
            self.statement(stmt)?;
        }
        Ok(())
    }

    pub fn statement(&mut self, stmt: &Stmt) -> Result<(), CoreError> {
        match &stmt.kind {
            StmtKind::Let(assignments) => {
                let compiled = LetCompiler::new(self).compile(assignments)?;
                for assignment in compiled {
                    self.writer.line(&assignment.code);
                }
            }
            StmtKind::Declare(declarations) => {
                for declaration in declarations {
                    self.symbols
                        .declare(&declaration.name, stmt.location.clone());
                    if let Some(init) = &declaration.init {
                        let value = self.render_expr(init)?;
                        self.writer
                            .line(&format!("${} = {value};", declaration.name));
                    }
                }
            }
            StmtKind::Expression(expr) => {
                let code = self.render_expr(expr)?;
                self.writer.line(&format!("{code};"));
            }
            StmtKind::If {
                condition,
                then_branch,
                else_ifs,
                else_branch,
            } => self.if_statement(condition, then_branch, else_ifs, else_branch.as_deref())?,
            StmtKind::Loop(body) => {
                self.writer.open_block("while (true)", false);
                self.block(body)?;
                self.writer.close_block("");
            }
            StmtKind::While { condition, body } => {
                let condition = self.render_expr(condition)?;
                self.writer.open_block(&format!("while ({condition})"), false);
                self.block(body)?;
                self.writer.close_block("");
            }
            StmtKind::DoWhile { body, condition } => {
                self.writer.open_block("do", false);
                self.block(body)?;
                let condition = self.render_expr(condition)?;
                self.writer.close_block(&format!(" while ({condition});"));
            }
            StmtKind::For {
                key,
                value,
                reverse,
                iterable,
                body,
            } => {
                let mut source = self.render_expr(iterable)?;
                if *reverse {
                    source = format!("array_reverse({source})");
                }
                let value = value.as_deref().unwrap_or("_");
                self.symbols.declare(value, stmt.location.clone());
                let header = match key.as_deref() {
                    Some(key) if key != "_" => {
                        self.symbols.declare(key, stmt.location.clone());
                        format!("foreach ({source} as ${key} => ${value})")
                    }
                    _ => format!("foreach ({source} as ${value})"),
                };
                self.writer.open_block(&header, false);
                self.block(body)?;
                self.writer.close_block("");
            }
            StmtKind::Switch { subject, clauses } => {
                let subject = self.render_expr(subject)?;
                self.writer.open_block(&format!("switch ({subject})"), false);
                for clause in clauses {
                    self.clause(clause)?;
                }
                self.writer.close_block("");
            }
            StmtKind::Continue => self.writer.line("continue;"),
            StmtKind::Break => self.writer.line("break;"),
            StmtKind::Return(value) => match value {
                Some(value) => {
                    let value = self.render_expr(value)?;
                    self.writer.line(&format!("return {value};"));
                }
                None => self.writer.line("return;"),
            },
            StmtKind::Throw(value) => {
                let value = self.render_expr(value)?;
                self.writer.line(&format!("throw {value};"));
            }
            StmtKind::Unset(value) => {
                let value = self.render_expr(value)?;
                self.writer.line(&format!("unset({value});"));
            }
            StmtKind::Echo(values) => {
                let mut rendered = Vec::with_capacity(values.len());
                for value in values {
                    rendered.push(self.render_expr(value)?);
                }
                self.writer.line(&format!("echo {};", rendered.join(" . ")));
            }
            StmtKind::Require(path) => {
                let path = self.render_expr(path)?;
                self.writer.line(&format!("require {path};"));
            }
            StmtKind::TryCatch { body, catches } => self.try_catch(body, catches)?,
            StmtKind::Comment(text) => self.comment(text),
            StmtKind::Empty => {}
        }
        Ok(())
    }

    /// `if (fetch v, expr)` checks `isset(expr)` and assigns `$v` first thing
    /// in the branch.
    fn condition(&mut self, condition: &Expr) -> Result<(String, Option<String>), CoreError> {
        match &condition.kind {
            ExprKind::Fetch { variable, expr } => {
                let source = self.render_expr(expr)?;
                self.symbols
                    .variable_for_write(variable, &condition.location);
                Ok((
                    format!("isset({source})"),
                    Some(format!("${variable} = {source};")),
                ))
            }
            _ => Ok((self.render_expr(condition)?, None)),
        }
    }

    fn if_statement(
        &mut self,
        condition: &Expr,
        then_branch: &[Stmt],
        else_ifs: &[ElseIf],
        else_branch: Option<&[Stmt]>,
    ) -> Result<(), CoreError> {
        let (test, fetched) = self.condition(condition)?;
        self.writer.open_block(&format!("if ({test})"), false);
        if let Some(assign) = fetched {
            self.writer.line(&assign);
        }
        self.block(then_branch)?;
        for else_if in else_ifs {
            let (test, fetched) = self.condition(&else_if.condition)?;
            self.writer.unindent();
            self.writer.line(&format!("}} elseif ({test}) {{"));
            self.writer.indent();
            if let Some(assign) = fetched {
                self.writer.line(&assign);
            }
            self.block(&else_if.body)?;
        }
        if let Some(else_branch) = else_branch {
            self.writer.unindent();
            self.writer.line("} else {");
            self.writer.indent();
            self.block(else_branch)?;
        }
        self.writer.close_block("");
        Ok(())
    }

    fn clause(&mut self, clause: &Clause) -> Result<(), CoreError> {
        let body = match clause {
            Clause::Case { test, body } => {
                let test = self.render_expr(test)?;
                self.writer.line(&format!("case {test}:"));
                body
            }
            Clause::Default { body } => {
                self.writer.line("default:");
                body
            }
        };
        self.writer.indent();
        self.block(body)?;
        self.writer.flush();
        self.writer.unindent();
        Ok(())
    }

    fn try_catch(&mut self, body: &[Stmt], catches: &[Catch]) -> Result<(), CoreError> {
        self.writer.open_block("try", false);
        self.block(body)?;
        for catch in catches {
            let classes = if catch.classes.is_empty() {
                "\\Exception".to_string()
            } else {
                catch.classes.join(" | ")
            };
            let header = match &catch.variable {
                Some(variable) => {
                    self.symbols.declare(variable, Location::default());
                    format!("}} catch ({classes} ${variable}) {{")
                }
                None => format!("}} catch ({classes}) {{"),
            };
            self.writer.unindent();
            self.writer.line(&header);
            self.writer.indent();
            self.block(&catch.body)?;
        }
        self.writer.close_block("");
        Ok(())
    }
}

fn modifiers(visibility: &[String], allow_abstract: bool) -> String {
    visibility
        .iter()
        .map(|v| v.trim())
        .filter(|v| PHP_MODIFIERS.contains(v))
        .filter(|v| allow_abstract || *v != "abstract")
        .collect::<Vec<_>>()
        .join(" ")
}
