//! Session command: drive an estimator and a sampler with message lines.
//!
//! Each line names a target and carries one message:
//!
//! ```text
//! estimator 4        # record symbol 4 (alias: e)
//! e bang             # emit set_matrix rows
//! e symbols          # emit the row to symbol table
//! estimator2 4       # second-order estimator (alias: e2)
//! sampler size 3     # (alias: s)
//! pipe               # load the estimator's matrix into the sampler
//! s bang
//! ```

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::{error, info, info_span, warn};

use alea_markov::{
    MarkovSampler, Message, Output, Receiver, SecondOrderEstimator, TransitionEstimator,
};

use crate::cli::SessionArgs;
use crate::config::AleaConfig;
use crate::{convert, input};

/// Run a message session.
pub fn run(args: SessionArgs) -> Result<()> {
    let _cmd = info_span!("session").entered();
    let config = AleaConfig::load(args.config.as_deref())?;

    let est_cfg = convert::build_estimator_config(&config.estimator)?;
    let sampler_cfg = convert::build_sampler_config(&config.sampler, config.seed)?;
    let mut session = Session {
        estimator: TransitionEstimator::from_config(&est_cfg)?,
        second_order: SecondOrderEstimator::from_config(&est_cfg)?,
        sampler: MarkovSampler::from_config(&sampler_cfg)?,
    };
    if let Some(m) = convert::build_matrix(&config.sampler)? {
        session.sampler.load_matrix(m)?;
        session.sampler.set_state(sampler_cfg.initial_state() as i64)?;
    }
    info!(seed = session.sampler.seed_value(), "session started");

    let reader = input::open(&args.input)?;
    let stdout = io::stdout();
    let handled = session.run_lines(reader, &mut stdout.lock())?;
    info!(lines = handled, "session finished");
    Ok(())
}

/// The roles a session routes messages to.
struct Session {
    estimator: TransitionEstimator,
    second_order: SecondOrderEstimator,
    sampler: MarkovSampler,
}

impl Session {
    /// Processes every line from `reader`, writing outputs to `out`.
    ///
    /// Returns the number of messages handled. Bad lines are logged and
    /// skipped; only I/O failures abort.
    fn run_lines(&mut self, reader: impl BufRead, out: &mut impl Write) -> Result<usize> {
        let mut handled = 0;
        for (lineno, line) in reader.lines().enumerate() {
            let line = line.context("failed to read message line")?;
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            for output in self.dispatch(lineno + 1, line) {
                writeln!(out, "{output}").context("failed to write output")?;
            }
            handled += 1;
        }
        Ok(handled)
    }

    /// Routes one line to its target.
    fn dispatch(&mut self, lineno: usize, line: &str) -> Vec<Output> {
        let (target, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(t, r)| (t, r.trim()));

        if target == "pipe" {
            self.pipe();
            return Vec::new();
        }

        let msg = match rest.parse::<Message>() {
            Ok(msg) => msg,
            Err(e) => {
                error!(line = lineno, "{e}");
                return Vec::new();
            }
        };
        match target {
            "estimator" | "e" => self.estimator.receive(&msg),
            "estimator2" | "e2" => self.second_order.receive(&msg),
            "sampler" | "s" => self.sampler.receive(&msg),
            other => {
                warn!(line = lineno, target = other, "unknown target, line skipped");
                Vec::new()
            }
        }
    }

    /// Replaces the sampler's matrix with the estimator's current one.
    fn pipe(&mut self) {
        let matrix = self.estimator.build_matrix();
        if matrix.is_empty() {
            warn!("no data to analyze, matrix is empty");
            return;
        }
        match self.sampler.load_matrix(matrix) {
            Ok(()) => info!(n_states = self.sampler.n_states(), "matrix piped to sampler"),
            Err(e) => error!("{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            estimator: TransitionEstimator::new(),
            second_order: SecondOrderEstimator::new(),
            sampler: MarkovSampler::with_seed(11),
        }
    }

    fn run_script(session: &mut Session, script: &str) -> Vec<String> {
        let mut out = Vec::new();
        session.run_lines(script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn estimator_bang_prints_rows() {
        let mut s = session();
        let lines = run_script(&mut s, "e 1\ne 2\ne 1\ne 3\ne 1\ne 2\ne bang\n");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("set_matrix 2 1 0 0"));
    }

    #[test]
    fn comments_and_blank_lines_skipped() {
        let mut s = session();
        let mut out = Vec::new();
        let handled = s
            .run_lines("# header\n\n  e 5   # trailing\n".as_bytes(), &mut out)
            .unwrap();
        assert_eq!(handled, 1);
        assert_eq!(s.estimator.symbols(), &[5]);
    }

    #[test]
    fn pipe_then_sample() {
        let mut s = session();
        let lines = run_script(&mut s, "e 7\ne 8\ne 7\npipe\ns 2\ns bang\ns bang\n");
        // 7 -> 8 and 8 -> 7 are certain.
        assert_eq!(lines, vec!["1", "2"]);
    }

    #[test]
    fn pipe_with_empty_estimator_keeps_sampler() {
        let mut s = session();
        run_script(&mut s, "s size 2\npipe\n");
        assert_eq!(s.sampler.n_states(), 2);
    }

    #[test]
    fn bad_lines_do_not_abort() {
        let mut s = session();
        let lines = run_script(&mut s, "nowhere bang\ns frobnicate\ne x\ns size 1\ns bang\n");
        assert_eq!(lines, vec!["1"]);
    }

    #[test]
    fn symbol_table_labels_piped_states() {
        let mut s = session();
        let lines = run_script(&mut s, "e 60\ne 64\ne 60\ne symbols\npipe\ns bang\n");
        assert_eq!(lines, vec!["1 60", "2 64", "2"]);
    }

    #[test]
    fn second_order_target() {
        let mut s = session();
        let lines = run_script(&mut s, "e2 1\ne2 2\ne2 1\ne2 bang\n");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "set_matrix 1 2 1 0");
        assert!(s.estimator.symbols().is_empty());
    }

    #[test]
    fn sampler_rows_authored_by_message() {
        let mut s = session();
        run_script(&mut s, "s size 2\ns set_matrix 1 0 1\ns set_matrix 2 1 0\n");
        assert_eq!(
            s.sampler.matrix().to_rows(),
            vec![vec![0.0, 1.0], vec![1.0, 0.0]]
        );
    }
}
