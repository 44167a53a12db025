use miette::Result;

use crate::{
    error,
    pass::{Assembly, PassOptions, PassReport, SourceLoader},
    table::OpcodeTable,
};

pub const DEFAULT_MAX_PASSES: usize = 8;

#[derive(Clone, Copy, Debug)]
pub struct AssemblerOptions {
    /// Discovery passes to run before giving up on convergence.
    pub max_passes: usize,
    pub html: bool,
    pub trace: bool,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        AssemblerOptions {
            max_passes: DEFAULT_MAX_PASSES,
            html: false,
            trace: false,
        }
    }
}

/// Result of a full assembly: the state after emission and its report.
#[derive(Debug)]
pub struct Assembled {
    pub assembly: Assembly,
    pub report: PassReport,
    /// Discovery passes run, not counting the emission pass.
    pub passes: usize,
    pub converged: bool,
}

impl Assembled {
    pub fn is_ok(&self) -> bool {
        self.report.fatals == 0
    }
}

/// Run discovery passes until no symbol changes value, then one emission pass.
pub fn assemble<T, L>(
    table: &T,
    loader: &L,
    main: &str,
    options: &AssemblerOptions,
) -> Result<Assembled>
where
    T: OpcodeTable + ?Sized,
    L: SourceLoader + ?Sized,
{
    let mut assembly = Assembly::new();
    let discovery = PassOptions {
        write_output: false,
        html: false,
        trace: options.trace,
    };

    let mut passes = 0;
    let mut converged = false;
    while passes < options.max_passes.max(1) {
        assembly.run_pass(table, loader, main, discovery)?;
        passes += 1;
        if !assembly.symbols.changed() {
            converged = true;
            break;
        }
    }

    let emission = PassOptions {
        write_output: true,
        html: options.html,
        trace: options.trace,
    };
    let mut report = assembly.run_pass(table, loader, main, emission)?;
    if !converged {
        report.warnings += 1;
        report.diagnostics.push(error::no_convergence(passes));
    }

    Ok(Assembled {
        assembly,
        report,
        passes,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{block2, pass::MemoryLoader};

    fn build(src: &str, max_passes: usize) -> Assembled {
        let loader = MemoryLoader::new().with_file("MAIN.agc", src);
        let options = AssemblerOptions {
            max_passes,
            ..AssemblerOptions::default()
        };
        assemble(&block2::table(), &loader, "MAIN.agc", &options).unwrap()
    }

    #[test]
    fn forward_references_settle() {
        let out = build("\t\tSETLOC\t4000\nLOC1\t\tTC\tLOC2\nLOC2\t\tTC\tLOC1\n", 8);
        assert!(out.is_ok());
        assert!(out.converged);
        assert_eq!(out.assembly.image.get(2, 0), Some(0o4001));
        assert_eq!(out.assembly.image.get(2, 1), Some(0o4000));
        assert_eq!(out.assembly.lines.len(), 2);
    }

    #[test]
    fn undefined_symbol_is_fatal_on_emission() {
        let out = build("\t\tSETLOC\t4000\n\t\tTC\tNOWHERE\n", 8);
        assert_eq!(out.report.fatals, 1);
        assert!(!out.is_ok());
        assert!(out.report.listing.contains("Symbol \"NOWHERE\" undefined."));
        assert!(out.report.listing.contains("????? "));
    }

    #[test]
    fn pass_cap_is_reported() {
        let out = build("\t\tSETLOC\t4000\nLOC1\t\tTC\tLOC1\n", 1);
        assert_eq!(out.passes, 1);
        assert!(!out.converged);
        assert_eq!(out.report.warnings, 1);
    }

    #[test]
    fn sources_without_labels_converge_at_once() {
        let out = build("\t\tSETLOC\t4000\n\t\tOCT\t7\n", 8);
        assert!(out.converged);
        assert_eq!(out.passes, 1);
        assert_eq!(out.assembly.image.get(2, 0), Some(7));
    }
}
