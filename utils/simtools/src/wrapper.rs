use std::path::Path;

use simulator::{Logic, Scenario, Step};

/// Render a scenario as a plain Verilog testbench module.
///
/// The module is named after the scenario and instantiates `hdl_toplevel` as
/// `dut`, connecting every driven signal by name. Undriven DUT ports are left
/// open. When `waveform` is set the whole hierarchy is dumped to it.
pub fn render_testbench(hdl_toplevel: &str, scenario: &Scenario, waveform: Option<&Path>) -> String {
    let module = &scenario.name;
    let unit = scenario.time_unit;

    let mut out = String::new();
    out.push_str(&format!("// Generated from scenario '{module}'\n"));
    out.push_str(&format!("`timescale 1{unit}/1{}\n", unit.precision()));
    out.push_str("/* verilator lint_off PINMISSING */\n");
    out.push_str(&format!("module {module};\n"));

    if let Some(clock) = &scenario.clock {
        let level = Logic::from(clock.start_high);
        out.push_str(&format!("  reg {} = {};\n", clock.signal, level.verilog_literal()));
    }
    for input in scenario.inputs() {
        out.push_str(&format!("  reg {input} = 1'b0;\n"));
    }
    out.push('\n');

    let ports = scenario.driven_signals();
    let connections: Vec<String> = ports
        .iter()
        .map(|port| format!("    .{port}({port})"))
        .collect();
    out.push_str(&format!("  {hdl_toplevel} dut (\n"));
    out.push_str(&connections.join(",\n"));
    out.push_str("\n  );\n\n");

    if let Some(clock) = &scenario.clock {
        let (first, first_hold, second, second_hold) = if clock.start_high {
            ("1'b0", clock.high_time(), "1'b1", clock.low_time())
        } else {
            ("1'b1", clock.low_time(), "1'b0", clock.high_time())
        };
        out.push_str("  always begin\n");
        out.push_str(&format!("    #{first_hold} {} = {first};\n", clock.signal));
        out.push_str(&format!("    #{second_hold} {} = {second};\n", clock.signal));
        out.push_str("  end\n\n");
    }

    out.push_str("  initial begin\n");
    if let Some(path) = waveform {
        out.push_str(&format!("    $dumpfile(\"{}\");\n", path.display()));
        out.push_str(&format!("    $dumpvars(0, {module});\n"));
    }
    for step in &scenario.steps {
        match step {
            Step::Set { signal, value } => {
                out.push_str(&format!("    {signal} <= {};\n", value.verilog_literal()))
            }
            Step::Wait(duration) => out.push_str(&format!("    #{duration};\n")),
        }
    }
    out.push_str("    $finish;\n");
    out.push_str("  end\n");
    out.push_str("endmodule\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse() -> Scenario {
        Scenario::new("testCom")
            .clock("clk", 10)
            .wait(90)
            .set("startTx", Logic::One)
            .wait(90)
            .set("startTx", Logic::Zero)
            .wait(400_000)
    }

    #[test]
    fn test_header_and_instance() {
        let tb = render_testbench("serialCom", &pulse(), None);
        assert!(tb.contains("`timescale 1ns/1ps"));
        assert!(tb.contains("module testCom;"));
        assert!(tb.contains("  reg clk = 1'b1;"));
        assert!(tb.contains("  reg startTx = 1'b0;"));
        assert!(tb.contains("  serialCom dut (\n    .clk(clk),\n    .startTx(startTx)\n  );"));
        assert!(tb.trim_end().ends_with("endmodule"));
        assert!(!tb.contains("$dumpfile"));
    }

    #[test]
    fn test_clock_and_schedule() {
        let tb = render_testbench("serialCom", &pulse(), Some(Path::new("sim_build/testCom.vcd")));
        assert!(tb.contains("    #5 clk = 1'b0;\n    #5 clk = 1'b1;"));
        assert!(tb.contains("$dumpfile(\"sim_build/testCom.vcd\");"));
        assert!(tb.contains("$dumpvars(0, testCom);"));

        let body: Vec<&str> = tb
            .lines()
            .skip_while(|line| !line.contains("initial begin"))
            .map(str::trim)
            .filter(|line| line.starts_with('#') || line.contains("<=") || line.starts_with("$finish"))
            .collect();
        assert_eq!(
            body,
            vec![
                "#90;",
                "startTx <= 1'b1;",
                "#90;",
                "startTx <= 1'b0;",
                "#400000;",
                "$finish;",
            ]
        );
    }

    #[test]
    fn test_without_clock() {
        let scenario = Scenario::new("bare").set("go", Logic::One).wait(1);
        let tb = render_testbench("top", &scenario, None);
        assert!(!tb.contains("always"));
        assert!(tb.contains("  top dut (\n    .go(go)\n  );"));
    }
}
