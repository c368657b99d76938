//! # VASP OUTCAR 解析器
//!
//! 单次前向扫描 OUTCAR 文本，提取能量历史、最终标量（费米能级、最大受力、压力）
//! 以及可选的诊断块（应力张量、磁矩表）。
//!
//! ## 状态机
//! ```text
//! Scanning ──TOTAL-FORCE──▶ InForceTable ──空行/分隔线──▶ Scanning
//!    │ ──FORCE on cell──▶ InStressBlock ──in kB/空行──▶ Scanning
//!    └ ──magnetization (z)──▶ InMagnetizationTable ──tot 行──▶ Scanning
//! ```
//! 输入在非 `Scanning` 状态下结束时，不完整的表格被丢弃并记录警告。
//!
//! ## 依赖关系
//! - 被 `operations/outcar.rs`, `batch/` 使用
//! - 使用 `models/run.rs`

use super::{is_rule, parse_count, parse_finite};
use crate::error::{Result, VaspError};
use crate::models::{
    EnergyPoint, IonicStepRecord, Magnetization, RunObservables, RunSummary, StressTensor,
};

use log::{debug, warn};
use regex::Regex;

const FORMAT: &str = "OUTCAR";
const FORCE_HEADER: &str = "TOTAL-FORCE (eV/Angst)";
const STRESS_HEADER: &str = "FORCE on cell =-STRESS";

/// 表头之后等待分隔线的最大行数
const TABLE_HEADER_LOOKAHEAD: usize = 4;

/// OUTCAR 解析器（持有预编译的标记正则）
pub struct OutcarParser {
    system_re: Regex,
    nions_re: Regex,
    toten_re: Regex,
    fermi_re: Regex,
    elec_iter_re: Regex,
    pressure_re: Regex,
    stress_re: Regex,
    axis: char,
    magnetization_header: String,
}

impl OutcarParser {
    /// 默认解析 z 方向磁矩
    pub fn new() -> Result<Self> {
        Self::with_axis('z')
    }

    pub fn with_axis(axis: char) -> Result<Self> {
        let axis = axis.to_ascii_lowercase();
        if !matches!(axis, 'x' | 'y' | 'z') {
            return Err(VaspError::invalid_field(
                "axis",
                format!("magnetization axis must be x, y or z, got '{}'", axis),
            ));
        }

        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| VaspError::Other(format!("invalid marker pattern: {}", e)))
        };

        Ok(OutcarParser {
            system_re: compile(r"^\s*SYSTEM\s*=\s*(.+)$")?,
            nions_re: compile(r"NIONS\s*=\s*(\S+)")?,
            toten_re: compile(r"free\s+energy\s+TOTEN\s*=\s*(\S+)")?,
            fermi_re: compile(r"E-fermi\s*:\s*(\S+)")?,
            elec_iter_re: compile(r"^\s*(?:DAV|RMM|CG)\s*:\s*\d+")?,
            pressure_re: compile(r"(?i)external\s+pressure\s*=\s*(\S+?)\s*kB")?,
            stress_re: compile(r"^\s*in\s+kB\b(.*)$")?,
            axis,
            magnetization_header: format!("magnetization ({})", axis),
        })
    }

    /// 解析 OUTCAR 文本，只返回摘要
    pub fn parse_summary(&self, text: &str) -> Result<RunSummary> {
        Ok(self.parse_observables(text)?.summary)
    }

    /// 解析 OUTCAR 文本，返回摘要与诊断可观测量
    pub fn parse_observables(&self, text: &str) -> Result<RunObservables> {
        self.parse_lines(text.lines())
    }

    /// 逐行解析
    pub fn parse_lines<I, S>(&self, lines: I) -> Result<RunObservables>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scanner = Scanner::new(self);
        for (idx, line) in lines.into_iter().enumerate() {
            scanner.feed(idx + 1, line.as_ref())?;
        }
        scanner.finish()
    }
}

// ─────────────────────────────────────────────────────────────
// 扫描状态
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum ScanState {
    Scanning,
    InForceTable(ForceTable),
    InStressBlock { opened_at: usize },
    InMagnetizationTable(MagnetizationTable),
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ForceTable {
    opened_at: usize,
    header_lines: usize,
    open: bool,
    rows: usize,
    max_norm: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct MagnetizationTable {
    opened_at: usize,
    header_lines: usize,
    open: bool,
    sites: Vec<f64>,
}

/// 当前离子步内尚未归属的观测值
#[derive(Debug, Default)]
struct PendingStep {
    max_force: Option<f64>,
    pressure: Option<f64>,
    fermi: Option<f64>,
}

struct Scanner<'a> {
    parser: &'a OutcarParser,
    state: ScanState,
    last_line: usize,

    system_name: Option<String>,
    nions: Option<usize>,
    electronic_iterations: usize,
    energies: Vec<EnergyPoint>,
    steps: Vec<IonicStepRecord>,
    pending: PendingStep,

    fermi: Option<f64>,
    max_force: Option<f64>,
    pressure: Option<f64>,
    stress: Option<StressTensor>,
    magnetization: Option<Magnetization>,

    summary_warnings: Vec<String>,
    observable_warnings: Vec<String>,
}

impl<'a> Scanner<'a> {
    fn new(parser: &'a OutcarParser) -> Self {
        Scanner {
            parser,
            state: ScanState::Scanning,
            last_line: 0,
            system_name: None,
            nions: None,
            electronic_iterations: 0,
            energies: Vec::new(),
            steps: Vec::new(),
            pending: PendingStep::default(),
            fermi: None,
            max_force: None,
            pressure: None,
            stress: None,
            magnetization: None,
            summary_warnings: Vec::new(),
            observable_warnings: Vec::new(),
        }
    }

    fn feed(&mut self, line_no: usize, line: &str) -> Result<()> {
        self.last_line = line_no;

        // 表格状态返回 None 表示该行不属于表格，需要按 Scanning 重新处理
        let next = match std::mem::replace(&mut self.state, ScanState::Scanning) {
            ScanState::Scanning => None,
            ScanState::InForceTable(table) => self.continue_force_table(table, line_no, line)?,
            ScanState::InStressBlock { opened_at } => {
                self.continue_stress_block(opened_at, line_no, line)?
            }
            ScanState::InMagnetizationTable(table) => {
                self.continue_magnetization_table(table, line_no, line)?
            }
        };

        match next {
            Some(state) => {
                self.state = state;
                Ok(())
            }
            None => self.scan(line_no, line),
        }
    }

    fn scan(&mut self, line_no: usize, line: &str) -> Result<()> {
        if line.contains(FORCE_HEADER) {
            self.state = ScanState::InForceTable(ForceTable {
                opened_at: line_no,
                ..ForceTable::default()
            });
            return Ok(());
        }

        if line.contains(STRESS_HEADER) {
            self.state = ScanState::InStressBlock { opened_at: line_no };
            return Ok(());
        }

        if line
            .trim()
            .eq_ignore_ascii_case(&self.parser.magnetization_header)
        {
            self.state = ScanState::InMagnetizationTable(MagnetizationTable {
                opened_at: line_no,
                ..MagnetizationTable::default()
            });
            return Ok(());
        }

        // "   SYSTEM =  Si2 test"
        if self.system_name.is_none() {
            if let Some(caps) = self.parser.system_re.captures(line) {
                let name = caps[1].trim();
                if !name.is_empty() {
                    self.system_name = Some(name.to_string());
                }
            }
        }

        // "   number of dos      NEDOS =    301   number of ions     NIONS =      2"
        if self.nions.is_none() {
            if let Some(caps) = self.parser.nions_re.captures(line) {
                self.nions = Some(parse_count(&caps[1], FORMAT, line_no, "NIONS")?);
            }
        }

        // "       DAV:   1    -0.10000000E+02 ..."
        if self.parser.elec_iter_re.is_match(line) {
            self.electronic_iterations += 1;
        }

        // " E-fermi :   5.2000     XC(G=0):  -8.1234"
        if let Some(caps) = self.parser.fermi_re.captures(line) {
            let value = parse_finite(&caps[1], FORMAT, line_no, "Fermi energy")?;
            self.fermi = Some(value);
            self.pending.fermi = Some(value);
        }

        // "  external pressure =       -1.50 kB  Pullay stress =        0.00 kB"
        if let Some(caps) = self.parser.pressure_re.captures(line) {
            let value = parse_finite(&caps[1], FORMAT, line_no, "external pressure")?;
            self.pressure = Some(value);
            self.pending.pressure = Some(value);
        }

        // "  in kB       -1.00000    -1.50000    -2.00000     0.10000     0.20000     0.30000"
        if self.parser.stress_re.is_match(line) {
            self.take_stress(line_no, line)?;
        }

        // "  free  energy   TOTEN  =       -10.50000000 eV"
        if let Some(caps) = self.parser.toten_re.captures(line) {
            let value = parse_finite(&caps[1], FORMAT, line_no, "free energy")?;
            self.push_energy(value);
        }

        Ok(())
    }

    fn push_energy(&mut self, total_energy_ev: f64) {
        let ionic_step = self.energies.len() + 1;
        let pending = std::mem::take(&mut self.pending);
        self.energies.push(EnergyPoint {
            ionic_step,
            total_energy_ev,
        });
        self.steps.push(IonicStepRecord {
            ionic_step,
            total_energy_ev,
            max_force_ev_per_a: pending.max_force,
            external_pressure_kb: pending.pressure,
            fermi_energy_ev: pending.fermi,
        });
    }

    fn take_stress(&mut self, line_no: usize, line: &str) -> Result<()> {
        let Some(caps) = self.parser.stress_re.captures(line) else {
            return Ok(());
        };
        let tokens: Vec<&str> = caps[1].split_whitespace().collect();
        if tokens.len() < 6 {
            return Err(VaspError::parse(
                FORMAT,
                line_no,
                format!("stress line has {} components, expected 6", tokens.len()),
            ));
        }

        let mut values = [0.0; 6];
        for (slot, token) in values.iter_mut().zip(&tokens) {
            *slot = parse_finite(token, FORMAT, line_no, "stress")?;
        }
        self.stress = Some(StressTensor::from_voigt(values));
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // 力表
    // ─────────────────────────────────────────────────────────────

    fn continue_force_table(
        &mut self,
        mut table: ForceTable,
        line_no: usize,
        line: &str,
    ) -> Result<Option<ScanState>> {
        if !table.open {
            if is_rule(line) {
                table.open = true;
                return Ok(Some(ScanState::InForceTable(table)));
            }
            table.header_lines += 1;
            if table.header_lines > TABLE_HEADER_LOOKAHEAD {
                self.summary_warnings.push(format!(
                    "Force table header at line {} has no column rule; table ignored",
                    table.opened_at
                ));
                return Ok(None);
            }
            return Ok(Some(ScanState::InForceTable(table)));
        }

        let row = line.trim();
        if row.is_empty() || is_rule(row) {
            self.close_force_table(table);
            return Ok(Some(ScanState::Scanning));
        }

        // POSITION (x y z) + TOTAL-FORCE (fx fy fz)
        let parts: Vec<&str> = row.split_whitespace().collect();
        if parts.len() < 6 {
            return Ok(Some(ScanState::InForceTable(table)));
        }

        let n = parts.len();
        let fx = parse_finite(parts[n - 3], FORMAT, line_no, "force")?;
        let fy = parse_finite(parts[n - 2], FORMAT, line_no, "force")?;
        let fz = parse_finite(parts[n - 1], FORMAT, line_no, "force")?;

        let norm = (fx * fx + fy * fy + fz * fz).sqrt();
        table.max_norm = table.max_norm.max(norm);
        table.rows += 1;

        Ok(Some(ScanState::InForceTable(table)))
    }

    fn close_force_table(&mut self, table: ForceTable) {
        if table.rows == 0 {
            self.summary_warnings.push(format!(
                "Force table at line {} contained no rows",
                table.opened_at
            ));
            return;
        }

        debug!(
            "force table at line {}: {} rows, max |F| = {}",
            table.opened_at, table.rows, table.max_norm
        );
        // 后出现的步更接近收敛，直接覆盖
        self.max_force = Some(table.max_norm);
        self.pending.max_force = Some(table.max_norm);
    }

    // ─────────────────────────────────────────────────────────────
    // 应力块
    // ─────────────────────────────────────────────────────────────

    fn continue_stress_block(
        &mut self,
        opened_at: usize,
        line_no: usize,
        line: &str,
    ) -> Result<Option<ScanState>> {
        if self.parser.stress_re.is_match(line) {
            self.take_stress(line_no, line)?;
            return Ok(Some(ScanState::Scanning));
        }
        if line.trim().is_empty() {
            debug!("stress block at line {} closed without 'in kB' row", opened_at);
            return Ok(None);
        }
        Ok(Some(ScanState::InStressBlock { opened_at }))
    }

    // ─────────────────────────────────────────────────────────────
    // 磁矩表
    // ─────────────────────────────────────────────────────────────

    fn continue_magnetization_table(
        &mut self,
        mut table: MagnetizationTable,
        line_no: usize,
        line: &str,
    ) -> Result<Option<ScanState>> {
        if !table.open {
            if is_rule(line) {
                table.open = true;
                return Ok(Some(ScanState::InMagnetizationTable(table)));
            }
            table.header_lines += 1;
            if table.header_lines > TABLE_HEADER_LOOKAHEAD {
                self.observable_warnings.push(format!(
                    "Magnetization table header at line {} has no column rule; table ignored",
                    table.opened_at
                ));
                return Ok(None);
            }
            return Ok(Some(ScanState::InMagnetizationTable(table)));
        }

        let row = line.trim();
        if row.is_empty() {
            self.observable_warnings.push(format!(
                "Magnetization table at line {} ended without a total row; table dropped",
                table.opened_at
            ));
            return Ok(Some(ScanState::Scanning));
        }

        if is_rule(row) || row.to_ascii_lowercase().starts_with("# of ion") {
            return Ok(Some(ScanState::InMagnetizationTable(table)));
        }

        let parts: Vec<&str> = row.split_whitespace().collect();
        let lead = parts[0];
        let last = parts[parts.len() - 1];

        if lead.eq_ignore_ascii_case("tot") {
            let total = parse_finite(last, FORMAT, line_no, "total magnetic moment")?;
            self.close_magnetization_table(table, total);
            return Ok(Some(ScanState::Scanning));
        }

        if lead.parse::<usize>().is_ok() {
            if parts.len() < 2 {
                return Err(VaspError::parse(
                    FORMAT,
                    line_no,
                    "magnetization row has no moment column",
                ));
            }
            table
                .sites
                .push(parse_finite(last, FORMAT, line_no, "magnetic moment")?);
            return Ok(Some(ScanState::InMagnetizationTable(table)));
        }

        self.observable_warnings.push(format!(
            "Magnetization table at line {} interrupted at line {}; table dropped",
            table.opened_at, line_no
        ));
        Ok(None)
    }

    fn close_magnetization_table(&mut self, table: MagnetizationTable, total: f64) {
        if let Some(nions) = self.nions {
            if nions != table.sites.len() {
                self.observable_warnings.push(format!(
                    "Magnetization table at line {} lists {} sites but NIONS = {}; table dropped",
                    table.opened_at,
                    table.sites.len(),
                    nions
                ));
                return;
            }
        }

        debug!(
            "magnetization table at line {}: {} sites, total {}",
            table.opened_at,
            table.sites.len(),
            total
        );
        self.magnetization = Some(Magnetization {
            axis: self.parser.axis,
            total_moment_mu_b: total,
            site_moments_mu_b: table.sites,
        });
    }

    // ─────────────────────────────────────────────────────────────
    // 收尾
    // ─────────────────────────────────────────────────────────────

    fn finish(mut self) -> Result<RunObservables> {
        match std::mem::replace(&mut self.state, ScanState::Scanning) {
            ScanState::Scanning => {}
            ScanState::InForceTable(table) => {
                warn!("input ended inside force table opened at line {}", table.opened_at);
                self.summary_warnings.push(format!(
                    "Input ended inside force table opened at line {}; partial table dropped",
                    table.opened_at
                ));
            }
            ScanState::InStressBlock { opened_at } => {
                warn!("input ended inside stress block opened at line {}", opened_at);
                self.observable_warnings.push(format!(
                    "Input ended inside stress block opened at line {}; partial block dropped",
                    opened_at
                ));
            }
            ScanState::InMagnetizationTable(table) => {
                warn!(
                    "input ended inside magnetization table opened at line {}",
                    table.opened_at
                );
                self.observable_warnings.push(format!(
                    "Input ended inside magnetization table opened at line {}; partial table dropped",
                    table.opened_at
                ));
            }
        }

        let Some(final_point) = self.energies.last().copied() else {
            return Err(VaspError::parse(
                FORMAT,
                self.last_line,
                "No free energy (TOTEN) records were found",
            ));
        };

        if self.fermi.is_none() {
            self.summary_warnings
                .push("No Fermi energy records were found".to_string());
        }
        if self.max_force.is_none() {
            self.summary_warnings.push("No force table was found".to_string());
        }

        if self.pressure.is_none() {
            self.observable_warnings
                .push("No external pressure records were found".to_string());
        }
        if self.stress.is_none() {
            self.observable_warnings
                .push("No stress tensor records were found".to_string());
        }
        if self.magnetization.is_none() {
            self.observable_warnings.push(format!(
                "No magnetization ({}) table was found",
                self.parser.axis
            ));
        }

        let summary = RunSummary {
            system_name: self.system_name,
            nions: self.nions,
            ionic_steps: self.energies.len(),
            electronic_iterations: self.electronic_iterations,
            final_total_energy_ev: final_point.total_energy_ev,
            final_fermi_energy_ev: self.fermi,
            max_force_ev_per_a: self.max_force,
            energy_history: self.energies,
            warnings: self.summary_warnings,
        };

        Ok(RunObservables {
            summary,
            external_pressure_kb: self.pressure,
            stress_tensor_kb: self.stress,
            magnetization: self.magnetization,
            steps: self.steps,
            warnings: self.observable_warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const SAMPLE: &str = include_str!("../../tests/fixtures/OUTCAR.sample");

    fn parser() -> OutcarParser {
        OutcarParser::new().unwrap()
    }

    #[test]
    fn test_parse_outcar_summary_fields() {
        let summary = parser().parse_summary(SAMPLE).unwrap();

        assert_eq!(summary.system_name.as_deref(), Some("Si2 test"));
        assert_eq!(summary.nions, Some(2));
        assert_eq!(summary.ionic_steps, 2);
        assert_eq!(summary.electronic_iterations, 4);
        assert!((summary.final_total_energy_ev - (-10.5)).abs() < 1e-12);
        assert!((summary.final_fermi_energy_ev.unwrap() - 5.2).abs() < 1e-12);
        assert!((summary.max_force_ev_per_a.unwrap() - 0.005).abs() < 1e-12);
        assert_eq!(summary.energy_history.len(), 2);
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn test_parse_outcar_observables() {
        let obs = parser().parse_observables(SAMPLE).unwrap();

        assert!((obs.external_pressure_kb.unwrap() - (-1.5)).abs() < 1e-12);
        let stress = obs.stress_tensor_kb.unwrap();
        assert_eq!(stress.xx_kb, -1.0);
        assert_eq!(stress.zx_kb, 0.3);

        let mag = obs.magnetization.unwrap();
        assert_eq!(mag.axis, 'z');
        assert_eq!(mag.site_moments_mu_b, vec![0.03, -0.03]);
        assert_eq!(mag.total_moment_mu_b, 0.0);
        assert!(obs.warnings.is_empty());
    }

    #[test]
    fn test_per_step_records_follow_source_order() {
        let obs = parser().parse_observables(SAMPLE).unwrap();

        assert_eq!(obs.steps.len(), 2);
        assert_eq!(obs.steps[0].ionic_step, 1);
        assert!((obs.steps[0].max_force_ev_per_a.unwrap() - 0.05).abs() < 1e-12);
        assert_eq!(obs.steps[0].external_pressure_kb, Some(11.0));
        assert_eq!(obs.steps[0].fermi_energy_ev, Some(5.1));
        assert_eq!(obs.steps[1].fermi_energy_ev, Some(5.2));
        assert_eq!(obs.steps[1].external_pressure_kb, Some(-1.5));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let p = parser();
        assert_eq!(
            p.parse_observables(SAMPLE).unwrap(),
            p.parse_observables(SAMPLE).unwrap()
        );
    }

    #[test]
    fn test_rejects_text_without_energy() {
        let err = parser().parse_summary("not a valid outcar").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ParseError);
    }

    #[test]
    fn test_unparsable_energy_is_parse_error() {
        let text = "  free  energy   TOTEN  =  ************ eV\n";
        let err = parser().parse_summary(text).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ParseError);
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_last_value_wins_for_scalars() {
        let text = r#"
 E-fermi :   1.0000     XC(G=0):  -8.1234
  free  energy   TOTEN  =       -5.00000000 eV
 E-fermi :   2.0000     XC(G=0):  -8.1234
  free  energy   TOTEN  =       -6.00000000 eV
 E-fermi :   3.0000     XC(G=0):  -8.1234
"#;
        let obs = parser().parse_observables(text).unwrap();
        assert_eq!(obs.summary.final_fermi_energy_ev, Some(3.0));
        assert_eq!(obs.summary.final_total_energy_ev, -6.0);
        // 最后一个 TOTEN 之后的观测值不属于任何离子步
        assert_eq!(obs.steps[1].fermi_energy_ev, Some(2.0));
    }

    #[test]
    fn test_two_close_energies() {
        let text = r#"
  free  energy   TOTEN  =       -10.500000 eV
  free  energy   TOTEN  =       -10.500001 eV
"#;
        let summary = parser().parse_summary(text).unwrap();
        let change = summary.final_energy_change_ev().unwrap();
        assert!((change - (-0.000001)).abs() < 1e-12);
    }

    #[test]
    fn test_truncated_force_table_is_dropped_with_warning() {
        let text = r#"
 POSITION                                       TOTAL-FORCE (eV/Angst)
 -----------------------------------------------------------------------------------
      0.00000      0.00000      0.00000         0.300000      0.400000      0.000000
 -----------------------------------------------------------------------------------
  free  energy   TOTEN  =       -3.00000000 eV
 POSITION                                       TOTAL-FORCE (eV/Angst)
 -----------------------------------------------------------------------------------
      0.00000      0.00000      0.00000         0.001000      0.000000      0.000000"#;
        let summary = parser().parse_summary(text).unwrap();
        assert!((summary.max_force_ev_per_a.unwrap() - 0.5).abs() < 1e-12);
        assert!(summary
            .warnings
            .iter()
            .any(|w| w.contains("partial table dropped")));
    }

    #[test]
    fn test_bad_force_component_is_parse_error() {
        let text = r#"
 POSITION                                       TOTAL-FORCE (eV/Angst)
 -----------------------------------------------------------------------------------
      0.00000      0.00000      0.00000         ********      0.400000      0.000000
"#;
        let err = parser().parse_summary(text).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ParseError);
    }

    #[test]
    fn test_missing_optional_blocks_are_warnings() {
        let text = "  free  energy   TOTEN  =       -1.00000000 eV\n";
        let obs = parser().parse_observables(text).unwrap();

        assert_eq!(obs.summary.ionic_steps, 1);
        assert!(obs.summary.warnings.contains(&"No force table was found".to_string()));
        assert!(obs
            .summary
            .warnings
            .contains(&"No Fermi energy records were found".to_string()));
        assert_eq!(obs.warnings.len(), 3);
        assert_eq!(obs.steps[0].max_force_ev_per_a, None);
    }

    #[test]
    fn test_magnetization_site_count_mismatch_drops_table() {
        let text = r#"
   number of dos      NEDOS =    301   number of ions     NIONS =      3
  free  energy   TOTEN  =       -1.00000000 eV
 magnetization (z)

# of ion       s       p       d       tot
------------------------------------------
    1        0.010   0.020   0.000   0.030
--------------------------------------------------
tot          0.010   0.020   0.000   0.030
"#;
        let obs = parser().parse_observables(text).unwrap();
        assert!(obs.magnetization.is_none());
        assert!(obs.warnings.iter().any(|w| w.contains("NIONS = 3")));
    }

    #[test]
    fn test_magnetization_axis_selection() {
        let text = r#"
  free  energy   TOTEN  =       -1.00000000 eV
 magnetization (x)

# of ion       s       p       d       tot
------------------------------------------
    1        0.100   0.200   0.300   0.600
--------------------------------------------------
tot          0.100   0.200   0.300   0.600
"#;
        let z = parser().parse_observables(text).unwrap();
        assert!(z.magnetization.is_none());

        let x = OutcarParser::with_axis('X')
            .unwrap()
            .parse_observables(text)
            .unwrap();
        let mag = x.magnetization.unwrap();
        assert_eq!(mag.axis, 'x');
        assert_eq!(mag.total_moment_mu_b, 0.6);
    }

    #[test]
    fn test_invalid_axis_is_validation_error() {
        let err = OutcarParser::with_axis('w').err().unwrap();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_stress_line_with_too_few_components() {
        let text = "  in kB       -1.00000    -1.50000\n";
        let err = parser().parse_summary(text).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ParseError);
    }
}
