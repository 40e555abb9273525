//! Parser for the HDL subset.
//!
//! Only the module header is mandatory. Everything inside the body is
//! parsed statement by statement; a statement that cannot be understood
//! becomes a [`Diagnostic`] and parsing carries on with the next one.

use super::ast::*;
use super::lexer::{parse_bit, Token, TokenKind};
use crate::circuit::GateKind;
use crate::error::{LogicError, Result};

/// Identifiers that can only start a statement. Meeting one inside a
/// statement means the previous `;` is missing.
const STATEMENT_KEYWORDS: &[&str] = &[
    "module", "endmodule", "input", "output", "inout", "wire", "reg", "assign", "always", "initial",
    "and", "or", "not", "nand", "nor", "xor", "xnor", "buf",
];

/// Net type words that may follow a direction keyword.
const NET_TYPES: &[&str] = &["wire", "reg", "logic", "signed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Input,
    Output,
}

/// Parser over a token stream.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    /// Create a parser. The stream is terminated with `Eof` if it is not
    /// already.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let line = tokens.last().map(|t| t.line).unwrap_or(1);
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                line,
                column: 1,
            });
        }
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Parse the first module in the stream.
    pub fn parse(mut self) -> Result<ParsedModule> {
        while !self.current().is_word("module") {
            if self.at_eof() {
                return Err(LogicError::NoModuleDeclaration);
            }
            self.advance();
        }
        let header_line = self.current().line;
        self.advance();

        let name = match self.current().kind {
            TokenKind::Identifier => self.current().text.clone(),
            _ => return Err(LogicError::NoModuleDeclaration),
        };
        self.advance();
        let mut module = ModuleAst::new(name, header_line);

        if self.current().kind == TokenKind::OpenParen {
            self.advance();
            self.parse_port_list(&mut module)?;
        }
        self.end_statement(header_line);

        let mut closed = false;
        while !self.at_eof() {
            let token = self.current().clone();
            if token.kind != TokenKind::Identifier {
                self.warn(token.line, format!("unexpected '{}'", token.text));
                self.skip_statement();
                continue;
            }
            match token.text.as_str() {
                "endmodule" => {
                    self.advance();
                    closed = true;
                    break;
                }
                // A second header before `endmodule`: the first module is
                // unterminated.
                "module" => break,
                "input" | "output" | "inout" => self.parse_declaration(&mut module),
                "wire" => self.parse_wire(&mut module),
                "assign" => self.parse_assign(&mut module),
                "always" | "initial" => self.skip_block(),
                "buf" => self.parse_primitive(CellKind::Alias, &mut module),
                word => match GateKind::from_primitive(word) {
                    Some(kind) => self.parse_primitive(CellKind::Gate(kind), &mut module),
                    None => {
                        self.warn(token.line, format!("unsupported statement '{}'", word));
                        self.skip_statement();
                    }
                },
            }
        }

        if !closed {
            let line = self.current().line;
            self.diagnostics.push(Diagnostic::error(line, "missing 'endmodule'"));
        }
        if !module.has_ports() {
            self.warn(header_line, "no input/output ports found");
        }

        Ok(ParsedModule {
            module,
            diagnostics: self.diagnostics,
        })
    }

    fn current(&self) -> &Token {
        // `new` guarantees a trailing Eof and `advance` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at_eof(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn advance(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    fn warn(&mut self, line: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::warning(line, message));
    }

    fn missing_semicolon(&mut self, line: usize) {
        self.diagnostics.push(Diagnostic::error(line, "missing ';'"));
    }

    /// Consume a `;`, or report it missing.
    fn end_statement(&mut self, line: usize) {
        if self.current().kind == TokenKind::Semicolon {
            self.advance();
        } else {
            self.missing_semicolon(line);
        }
    }

    /// Tokens of the current statement up to its `;`, which is consumed.
    fn statement_tokens(&mut self, line: usize) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.current().clone();
            match token.kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return tokens;
                }
                TokenKind::Eof => {
                    self.missing_semicolon(line);
                    return tokens;
                }
                TokenKind::Identifier if STATEMENT_KEYWORDS.contains(&token.text.as_str()) => {
                    self.missing_semicolon(line);
                    return tokens;
                }
                _ => {
                    tokens.push(token);
                    self.advance();
                }
            }
        }
    }

    fn skip_statement(&mut self) {
        let line = self.current().line;
        let stray_semicolon = self.current().kind == TokenKind::Semicolon;
        self.advance();
        if stray_semicolon {
            return;
        }
        self.statement_tokens(line);
    }

    /// Skip an `always`/`initial` block, including a `begin ... end` body.
    fn skip_block(&mut self) {
        let line = self.current().line;
        self.warn(line, "procedural blocks are not supported");
        self.advance();

        let mut depth = 0usize;
        while !self.at_eof() {
            let token = self.current();
            if token.is_word("begin") {
                depth += 1;
            } else if token.is_word("end") {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    self.advance();
                    return;
                }
            } else if token.kind == TokenKind::Semicolon && depth == 0 {
                self.advance();
                return;
            } else if token.is_word("endmodule") {
                return;
            }
            self.advance();
        }
    }

    fn parse_port_list(&mut self, module: &mut ModuleAst) -> Result<()> {
        let mut direction = None;
        loop {
            let token = self.current().clone();
            match token.kind {
                TokenKind::CloseParen => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::Eof => {
                    return Err(LogicError::parse(token.line, "unterminated port list"));
                }
                TokenKind::Comma => self.advance(),
                TokenKind::OpenBracket => self.skip_range(),
                TokenKind::Identifier => {
                    match token.text.as_str() {
                        "input" => direction = Some(Direction::Input),
                        "output" => direction = Some(Direction::Output),
                        "inout" => {
                            self.warn(token.line, "inout ports are not supported");
                            direction = None;
                        }
                        "endmodule" | "assign" => {
                            return Err(LogicError::parse(token.line, "expected ')' to close the port list"));
                        }
                        word if NET_TYPES.contains(&word) => {}
                        name => match direction {
                            Some(Direction::Input) => module.add_input(name),
                            Some(Direction::Output) => module.add_output(name),
                            // Non-ANSI header: the body declares the direction.
                            None => {}
                        },
                    }
                    self.advance();
                }
                _ => {
                    self.warn(token.line, format!("unexpected '{}' in port list", token.text));
                    self.advance();
                }
            }
        }
    }

    fn skip_range(&mut self) {
        let line = self.current().line;
        self.warn(line, "bus ranges are not supported; nets are treated as single bits");
        while !self.at_eof() && self.current().kind != TokenKind::CloseBracket {
            self.advance();
        }
        self.advance();
    }

    /// Names declared in a declaration's tokens, skipping net types and
    /// ranges.
    fn declared_names(&mut self, tokens: &[Token]) -> Vec<String> {
        let mut names = Vec::new();
        let mut in_range = false;
        for token in tokens {
            match token.kind {
                TokenKind::OpenBracket => {
                    in_range = true;
                    self.warn(token.line, "bus ranges are not supported; nets are treated as single bits");
                }
                TokenKind::CloseBracket => in_range = false,
                TokenKind::Identifier if !in_range && !NET_TYPES.contains(&token.text.as_str()) => {
                    names.push(token.text.clone());
                }
                _ => {}
            }
        }
        names
    }

    fn parse_declaration(&mut self, module: &mut ModuleAst) {
        let keyword = self.current().clone();
        self.advance();
        // The net type in `input wire a;` belongs to this declaration.
        while self.current().kind == TokenKind::Identifier && NET_TYPES.contains(&self.current().text.as_str()) {
            self.advance();
        }
        let tokens = self.statement_tokens(keyword.line);
        let names = self.declared_names(&tokens);
        match keyword.text.as_str() {
            "input" => names.iter().for_each(|n| module.add_input(n)),
            "output" => names.iter().for_each(|n| module.add_output(n)),
            _ => self.warn(keyword.line, "inout ports are not supported"),
        }
    }

    /// `wire a, b;` or the net declaration assignment `wire a = expr;`.
    fn parse_wire(&mut self, module: &mut ModuleAst) {
        let line = self.current().line;
        self.advance();
        let tokens = self.statement_tokens(line);

        match tokens.iter().position(|t| t.kind == TokenKind::Equals) {
            Some(eq) => {
                let names = self.declared_names(&tokens[..eq]);
                names.iter().for_each(|n| module.add_wire(n));
                match names.as_slice() {
                    [target] => self.add_assignment(module, target, &tokens[eq + 1..], line),
                    _ => self.warn(line, "malformed wire assignment"),
                }
            }
            None => {
                let names = self.declared_names(&tokens);
                names.iter().for_each(|n| module.add_wire(n));
            }
        }
    }

    fn parse_assign(&mut self, module: &mut ModuleAst) {
        let line = self.current().line;
        self.advance();
        let tokens = self.statement_tokens(line);

        match tokens.as_slice() {
            [target, eq, expr @ ..] if target.kind == TokenKind::Identifier && eq.kind == TokenKind::Equals => {
                let target = target.text.clone();
                self.add_assignment(module, &target, expr, line);
            }
            [_, bracket, ..] if bracket.kind == TokenKind::OpenBracket => {
                self.warn(line, "bit selects are not supported");
            }
            _ => self.warn(line, "malformed assign statement"),
        }
    }

    fn add_assignment(&mut self, module: &mut ModuleAst, target: &str, expr: &[Token], line: usize) {
        match classify(expr) {
            Ok((kind, inputs)) => module.cells.push(CellDef {
                kind,
                output: target.to_string(),
                inputs,
                line,
            }),
            Err(reason) => self.warn(line, format!("skipping assignment to '{}': {}", target, reason)),
        }
    }

    /// `and [name] (out, in1, in2, ...);`
    fn parse_primitive(&mut self, kind: CellKind, module: &mut ModuleAst) {
        let keyword = self.current().clone();
        self.advance();
        let tokens = self.statement_tokens(keyword.line);

        let start = match tokens.iter().position(|t| t.kind == TokenKind::OpenParen) {
            Some(i) if i <= 1 && tokens.last().map(|t| t.kind) == Some(TokenKind::CloseParen) => i,
            _ => {
                self.warn(keyword.line, format!("malformed '{}' instance", keyword.text));
                return;
            }
        };

        let terminals: std::result::Result<Vec<Operand>, String> = tokens[start + 1..tokens.len() - 1]
            .split(|t| t.kind == TokenKind::Comma)
            .map(|segment| match segment {
                [single] => operand(single),
                _ => Err("terminals must be single nets or constants".to_string()),
            })
            .collect();
        let mut terminals = match terminals {
            Ok(terminals) => terminals,
            Err(reason) => {
                self.warn(keyword.line, format!("skipping '{}' instance: {}", keyword.text, reason));
                return;
            }
        };

        let unary = matches!(kind, CellKind::Alias | CellKind::Gate(GateKind::Not));
        let arity_ok = if unary { terminals.len() == 2 } else { terminals.len() >= 3 };
        if !arity_ok {
            self.warn(
                keyword.line,
                format!("'{}' instance has {} terminal(s)", keyword.text, terminals.len()),
            );
            return;
        }

        let output = match terminals.remove(0) {
            Operand::Signal(name) => name,
            Operand::Const(_) => {
                self.warn(keyword.line, format!("'{}' instance drives a constant", keyword.text));
                return;
            }
        };
        module.cells.push(CellDef {
            kind,
            output,
            inputs: terminals,
            line: keyword.line,
        });
    }
}

fn operand(token: &Token) -> std::result::Result<Operand, String> {
    match token.kind {
        TokenKind::Identifier => Ok(Operand::Signal(token.text.clone())),
        TokenKind::Number => parse_bit(&token.text)
            .map(Operand::Const)
            .ok_or_else(|| format!("unsupported literal '{}'", token.text)),
        _ => Err(format!("unexpected '{}'", token.text)),
    }
}

/// True if the slice is one parenthesised group.
fn wrapped(tokens: &[Token]) -> bool {
    if tokens.len() < 2 || tokens[0].kind != TokenKind::OpenParen {
        return false;
    }
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::OpenParen => depth += 1,
            TokenKind::CloseParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == tokens.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

fn strip_parens(mut tokens: &[Token]) -> &[Token] {
    while wrapped(tokens) {
        tokens = &tokens[1..tokens.len() - 1];
    }
    tokens
}

fn operator_kind(kind: TokenKind) -> Option<GateKind> {
    match kind {
        TokenKind::And => Some(GateKind::And),
        TokenKind::Or => Some(GateKind::Or),
        TokenKind::Xor => Some(GateKind::Xor),
        TokenKind::Xnor => Some(GateKind::Xnor),
        _ => None,
    }
}

/// `x op y [op z ...]` with one operator throughout. `Ok(None)` for a
/// lone operand.
fn binary_chain(tokens: &[Token]) -> std::result::Result<Option<(GateKind, Vec<Operand>)>, String> {
    if tokens.len() == 1 {
        return Ok(None);
    }
    if tokens.len() < 3 || tokens.len() % 2 == 0 {
        return Err("unsupported expression".to_string());
    }

    let first_op = &tokens[1];
    let gate = operator_kind(first_op.kind).ok_or_else(|| format!("unexpected '{}'", first_op.text))?;
    let mut operands = Vec::with_capacity(tokens.len() / 2 + 1);
    for (i, token) in tokens.iter().enumerate() {
        if i % 2 == 0 {
            operands.push(operand(token).map_err(|e| match token.kind {
                TokenKind::Number => e,
                _ => "nested expressions are not supported".to_string(),
            })?);
        } else if token.kind != first_op.kind {
            return Err(match operator_kind(token.kind) {
                Some(_) => format!(
                    "expression mixes '{}' and '{}'; only single-gate expressions are supported",
                    first_op.text, token.text
                ),
                None => format!("unexpected '{}'", token.text),
            });
        }
    }
    if gate == GateKind::Xnor && operands.len() > 2 {
        return Err("chained '~^' is not supported".to_string());
    }
    Ok(Some((gate, operands)))
}

/// Map an assignment's right-hand side to a single gate.
///
/// Recognised forms, tried in this order: `~(x op y ...)` (NAND, NOR,
/// XNOR), `x op y ...` (AND, OR, XOR, XNOR), `~x` (NOT) and a bare
/// operand (alias).
fn classify(tokens: &[Token]) -> std::result::Result<(CellKind, Vec<Operand>), String> {
    let tokens = strip_parens(tokens);
    let Some(first) = tokens.first() else {
        return Err("empty expression".to_string());
    };

    if first.kind == TokenKind::Not {
        let rest = &tokens[1..];
        let inner = strip_parens(rest);
        if inner.len() == 1 {
            return Ok((CellKind::Gate(GateKind::Not), vec![operand(&inner[0])?]));
        }
        if !wrapped(rest) {
            return Err("unsupported expression".to_string());
        }
        let (gate, operands) = binary_chain(inner)?.ok_or_else(|| "unsupported expression".to_string())?;
        let inverted = match gate {
            GateKind::And => GateKind::Nand,
            GateKind::Or => GateKind::Nor,
            GateKind::Xor => GateKind::Xnor,
            _ => GateKind::Xor,
        };
        return Ok((CellKind::Gate(inverted), operands));
    }

    match binary_chain(tokens)? {
        Some((gate, operands)) => Ok((CellKind::Gate(gate), operands)),
        None => Ok((CellKind::Alias, vec![operand(first)?])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdl::Lexer;

    fn parse(input: &str) -> ParsedModule {
        let tokens = Lexer::new(input).tokenize().unwrap();
        Parser::new(tokens).parse().unwrap()
    }

    fn cell(parsed: &ParsedModule, output: &str) -> CellDef {
        parsed
            .module
            .cells
            .iter()
            .find(|c| c.output == output)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_ansi_header_with_shared_direction() {
        let parsed = parse("module m(input wire a, b, output y);\nassign y = a & b;\nendmodule");
        assert_eq!(parsed.module.name, "m");
        assert_eq!(parsed.module.inputs, vec!["a", "b"]);
        assert_eq!(parsed.module.outputs, vec!["y"]);
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_non_ansi_header() {
        let parsed = parse(
            "module m(a, b, y);\n  input a, b;\n  output y;\n  wire t;\n  assign t = a | b;\n  assign y = t;\nendmodule",
        );
        assert_eq!(parsed.module.inputs, vec!["a", "b"]);
        assert_eq!(parsed.module.outputs, vec!["y"]);
        assert_eq!(parsed.module.wires, vec!["t"]);
        assert_eq!(cell(&parsed, "t").kind, CellKind::Gate(GateKind::Or));
        assert_eq!(cell(&parsed, "y").kind, CellKind::Alias);
    }

    #[test]
    fn test_body_declarations_with_net_type() {
        let parsed = parse(
            "module m(a, b, y);\n input wire a;\n input wire b;\n output reg y;\n assign y = a & b;\nendmodule",
        );
        assert_eq!(parsed.module.inputs, vec!["a", "b"]);
        assert_eq!(parsed.module.outputs, vec!["y"]);
        assert!(parsed.module.wires.is_empty());
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(cell(&parsed, "y").kind, CellKind::Gate(GateKind::And));
    }

    #[test]
    fn test_expression_classification() {
        let parsed = parse(
            "module m(input a, b, output y);
               assign n1 = ~(a & b);
               assign n2 = ~(a | b);
               assign n3 = ~(a ^ b);
               assign n4 = a ^ b;
               assign n5 = ~a;
               assign n6 = (a & b);
               assign n7 = a ~^ b;
               assign n8 = ~(a);
             endmodule",
        );
        let kind = |name: &str| cell(&parsed, name).kind;
        assert_eq!(kind("n1"), CellKind::Gate(GateKind::Nand));
        assert_eq!(kind("n2"), CellKind::Gate(GateKind::Nor));
        assert_eq!(kind("n3"), CellKind::Gate(GateKind::Xnor));
        assert_eq!(kind("n4"), CellKind::Gate(GateKind::Xor));
        assert_eq!(kind("n5"), CellKind::Gate(GateKind::Not));
        assert_eq!(kind("n6"), CellKind::Gate(GateKind::And));
        assert_eq!(kind("n7"), CellKind::Gate(GateKind::Xnor));
        assert_eq!(kind("n8"), CellKind::Gate(GateKind::Not));
        assert_eq!(cell(&parsed, "n1").signal_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_multi_operand_and_constants() {
        let parsed = parse("module m(input a, b, c, output y, z);\nassign y = a & b & c;\nassign z = a | 1'b0;\nendmodule");
        let y = cell(&parsed, "y");
        assert_eq!(y.inputs.len(), 3);
        let z = cell(&parsed, "z");
        assert_eq!(z.inputs, vec![Operand::signal("a"), Operand::Const(false)]);
    }

    #[test]
    fn test_mixed_operators_warn_and_skip() {
        let parsed = parse("module m(input a, b, c, output y);\nassign y = a & b | c;\nendmodule");
        assert!(parsed.module.cells.is_empty());
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].line, 2);
        assert!(parsed.diagnostics[0].message.contains("mixes"));
        assert!(!parsed.has_errors());
    }

    #[test]
    fn test_primitive_instances() {
        let parsed = parse(
            "module m(input a, b, output y, z);\n  and g1 (t, a, b);\n  not (y, t);\n  buf (z, a);\n  nand (w, a, b, t);\nendmodule",
        );
        assert_eq!(cell(&parsed, "t").kind, CellKind::Gate(GateKind::And));
        assert_eq!(cell(&parsed, "y").kind, CellKind::Gate(GateKind::Not));
        assert_eq!(cell(&parsed, "z").kind, CellKind::Alias);
        assert_eq!(cell(&parsed, "w").inputs.len(), 3);
    }

    #[test]
    fn test_missing_semicolon_and_endmodule() {
        let parsed = parse("module m(input a, output y);\nassign y = ~a\n");
        let errors: Vec<_> = parsed.diagnostics.iter().filter(|d| d.is_error()).collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "missing ';'");
        assert_eq!(errors[1].message, "missing 'endmodule'");
        // The statement is still understood.
        assert_eq!(cell(&parsed, "y").kind, CellKind::Gate(GateKind::Not));
    }

    #[test]
    fn test_missing_semicolon_before_next_statement() {
        let parsed = parse("module m(input a, output y, z);\nassign y = ~a\nassign z = a;\nendmodule");
        assert_eq!(parsed.module.cells.len(), 2);
        assert_eq!(parsed.diagnostics, vec![Diagnostic::error(2, "missing ';'")]);
    }

    #[test]
    fn test_unsupported_constructs_are_skipped() {
        let parsed = parse(
            "module m(input clk, input [3:0] d, output y);
               reg r;
               always @(posedge clk) begin
                 r <= d;
               end
               assign y = clk;
             endmodule",
        );
        assert_eq!(parsed.module.inputs, vec!["clk", "d"]);
        assert_eq!(parsed.module.cells.len(), 1);
        assert!(!parsed.has_errors());
        assert_eq!(parsed.diagnostics.len(), 3);
    }

    #[test]
    fn test_no_ports_warning() {
        let parsed = parse("module empty();\nendmodule");
        assert_eq!(parsed.diagnostics, vec![Diagnostic::warning(1, "no input/output ports found")]);
    }

    #[test]
    fn test_no_module() {
        let tokens = Lexer::new("assign y = a;").tokenize().unwrap();
        assert!(matches!(Parser::new(tokens).parse(), Err(LogicError::NoModuleDeclaration)));
        assert!(matches!(
            Parser::new(Vec::new()).parse(),
            Err(LogicError::NoModuleDeclaration)
        ));
    }

    #[test]
    fn test_unterminated_port_list() {
        let tokens = Lexer::new("module m(input a,\n").tokenize().unwrap();
        assert!(matches!(Parser::new(tokens).parse(), Err(LogicError::ParseError { .. })));
    }
}
