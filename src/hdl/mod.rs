//! Text codec for the combinational HDL subset.
//!
//! A design is exchanged as a single Verilog-style module. The parser is
//! lenient: only the module header is required, and every statement it
//! cannot map onto a gate becomes a [`Diagnostic`] instead of an error.
//!
//! # Grammar Overview
//!
//! ```text
//! source      = { token } module
//! module      = "module" name [ "(" port_list ")" ] ";" { item } "endmodule"
//! port_list   = [ port { "," port } ]
//! port        = [ direction { net_type } [ range ] ] name
//! item        = declaration | wire_decl | assign | instance
//! declaration = direction { net_type } [ range ] name { "," name } ";"
//! wire_decl   = "wire" [ range ] name { "," name } [ "=" expr ] ";"
//! assign      = "assign" name "=" expr ";"
//! instance    = primitive [ name ] "(" operand { "," operand } ")" ";"
//!
//! direction   = "input" | "output"
//! net_type    = "wire" | "reg" | "logic" | "signed"
//! primitive   = "and" | "or" | "not" | "nand" | "nor" | "xor" | "xnor" | "buf"
//! expr        = operand                          (alias)
//!             | "~" operand                      (NOT)
//!             | operand { op operand }           (AND, OR, XOR, XNOR)
//!             | "~" "(" operand { op operand } ")"   (NAND, NOR, XNOR)
//! op          = "&" | "|" | "^" | "~^" | "^~"
//! operand     = name | "0" | "1" | "1'b0" | "1'b1"
//! ```
//!
//! Each expression maps to exactly one gate kind; more than two operands
//! become a chain of 2-input gates. Mixed operators, vectors and procedural
//! blocks are reported and skipped.
//!
//! # Example
//!
//! ```text
//! module half_adder(input wire a, b, output wire sum, carry);
//!     assign sum = a ^ b;
//!     assign carry = a & b;
//! endmodule
//! ```

mod ast;
mod elaborate;
mod generate;
mod lexer;
mod parser;

pub use ast::*;
pub use elaborate::{elaborate, elaborate_with, Elaboration};
pub use generate::{generate, generate_netlist, GeneratorOptions};
pub use lexer::{parse_bit, Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::error::Result;

/// Module name used by [`generate_netlist`] callers that have no preference.
pub const DEFAULT_NETLIST_MODULE: &str = "digital_circuit";

/// Parse HDL source into a module description.
pub fn parse(input: &str) -> Result<ParsedModule> {
    let tokens = Lexer::new(input).tokenize()?;
    Parser::new(tokens).parse()
}

/// Parse and elaborate in one go. Parser and elaboration diagnostics are
/// merged, in that order.
pub fn load(input: &str) -> Result<Elaboration> {
    let parsed = parse(input)?;
    let mut elaboration = elaborate(&parsed.module);
    let mut diagnostics = parsed.diagnostics;
    diagnostics.append(&mut elaboration.diagnostics);
    elaboration.diagnostics = diagnostics;
    Ok(elaboration)
}

/// Parse an HDL file.
#[cfg(feature = "cli")]
pub fn parse_file(path: &std::path::Path) -> Result<ParsedModule> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::LogicError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}

/// Parse and elaborate an HDL file.
#[cfg(feature = "cli")]
pub fn load_file(path: &std::path::Path) -> Result<Elaboration> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::LogicError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    load(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GateKind;
    use crate::sim::{propagate, SimConfig, TruthTable};

    const HALF_ADDER: &str = "module half_adder(input wire a, b, output wire sum, carry);
    assign sum = a ^ b;
    assign carry = a & b;
endmodule";

    #[test]
    fn test_parse_example_module() {
        let parsed = parse("module t(input a, input b, output y); assign y = ~(a & b); endmodule").unwrap();
        assert_eq!(parsed.module.inputs, vec!["a", "b"]);
        assert_eq!(parsed.module.outputs, vec!["y"]);
        assert_eq!(
            parsed.module.cells,
            vec![CellDef {
                kind: CellKind::Gate(GateKind::Nand),
                output: "y".to_string(),
                inputs: vec![Operand::signal("a"), Operand::signal("b")],
                line: 1,
            }]
        );
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_load_half_adder() {
        let mut e = load(HALF_ADDER).unwrap();
        assert!(e.diagnostics.is_empty());
        let (a, b) = (e.input_gate("a").unwrap(), e.input_gate("b").unwrap());
        let (sum, carry) = (e.output_gate("sum").unwrap(), e.output_gate("carry").unwrap());
        e.circuit.set_input(a, true).unwrap();
        e.circuit.set_input(b, true).unwrap();
        propagate(&mut e.circuit, SimConfig::interactive());
        assert_eq!(e.circuit.output_value(sum), Some(false));
        assert_eq!(e.circuit.output_value(carry), Some(true));
    }

    #[test]
    fn test_generated_text_round_trips() {
        let mut original = load(HALF_ADDER).unwrap().circuit;
        let expected = TruthTable::generate(&mut original).unwrap().output_signature();

        let assign_style = generate(&original, &GeneratorOptions::default());
        let mut reparsed = load(&assign_style).unwrap();
        assert!(reparsed.diagnostics.is_empty(), "{:?}", reparsed.diagnostics);
        assert_eq!(reparsed.circuit.gate_count(), original.gate_count());
        let actual = TruthTable::generate(&mut reparsed.circuit).unwrap().output_signature();
        assert_eq!(actual, expected);

        let netlist = generate_netlist(&original, DEFAULT_NETLIST_MODULE);
        let mut reparsed = load(&netlist).unwrap();
        assert!(reparsed.diagnostics.is_empty(), "{:?}", reparsed.diagnostics);
        let actual = TruthTable::generate(&mut reparsed.circuit).unwrap().output_signature();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_load_merges_diagnostics() {
        let e = load("module m(input a, output y);\nassign y = a & b | a;\nendmodule").unwrap();
        assert_eq!(e.diagnostics.len(), 2);
        assert!(e.diagnostics[0].message.contains("mixes"));
        assert!(e.diagnostics[1].message.contains("'y' is not driven"));
    }

    #[test]
    fn test_missing_module_is_fatal() {
        assert!(matches!(
            load("// nothing here\n"),
            Err(crate::error::LogicError::NoModuleDeclaration)
        ));
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_files_on_disk() {
        let path = std::env::temp_dir().join(format!("logicsim_half_adder_{}.v", std::process::id()));
        std::fs::write(&path, HALF_ADDER).unwrap();
        let parsed = parse_file(&path).unwrap();
        let loaded = load_file(&path);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(parsed.module.name, "half_adder");
        assert_eq!(loaded.unwrap().outputs.len(), 2);
        assert!(matches!(
            parse_file(&path),
            Err(crate::error::LogicError::FileReadError { .. })
        ));
    }
}
