use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use super::{Iterate, IterateError};

/// Errors raised while writing or reading an iterate file.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("cannot write an inconsistent iterate: {0}")]
    Inconsistent(#[source] IterateError),
}

impl TableError {
    fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

impl Iterate {
    /// Writes the iterate to a file, replacing any existing content.
    ///
    /// The format is plain text:
    ///
    /// ```text
    /// num_states=2
    /// num_controls=1
    /// time,x,v,F
    /// 0,0,0,1.5
    /// ...
    /// ```
    ///
    /// Values use the shortest representation that parses back to the same
    /// `f64`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Inconsistent`] if the tables do not match the
    /// channel names and time grid, or [`TableError::Io`] if writing fails.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        self.validate(self.state_names.len(), self.control_names.len())
            .map_err(TableError::Inconsistent)?;

        // Validated before the file is created so a bad iterate leaves it intact.
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the iterate to any writer in the format of [`Iterate::write`].
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Inconsistent`] if the tables do not match the
    /// channel names and time grid, or [`TableError::Io`] if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), TableError> {
        let num_states = self.state_names.len();
        let num_controls = self.control_names.len();
        self.validate(num_states, num_controls)
            .map_err(TableError::Inconsistent)?;

        writeln!(writer, "num_states={num_states}")?;
        writeln!(writer, "num_controls={num_controls}")?;

        let mut header = String::from("time");
        for name in self.state_names().iter().chain(self.control_names()) {
            header.push(',');
            header.push_str(name);
        }
        writeln!(writer, "{header}")?;

        for (col, t) in self.time.iter().enumerate() {
            write!(writer, "{t}")?;
            let states = (0..num_states).map(|row| self.states[(row, col)]);
            let controls = (0..num_controls).map(|row| self.controls[(row, col)]);
            for value in states.chain(controls) {
                write!(writer, ",{value}")?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Reads an iterate written by [`Iterate::write`].
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Io`] if the file cannot be read, or
    /// [`TableError::Parse`] naming the first malformed line.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, TableError> {
        Self::read_from(BufReader::new(File::open(path)?))
    }

    /// Reads an iterate from any buffered reader.
    ///
    /// # Errors
    ///
    /// As [`Iterate::read`].
    pub fn read_from<R: BufRead>(reader: R) -> Result<Self, TableError> {
        let mut lines = reader.lines().enumerate().map(|(i, line)| (i + 1, line));

        let mut last = 0;
        let mut next_line = |what: &str| -> Result<(usize, String), TableError> {
            match lines.next() {
                Some((number, line)) => {
                    last = number;
                    Ok((number, line?))
                }
                None => Err(TableError::parse(last + 1, format!("missing {what}"))),
            }
        };

        let (number, line) = next_line("state count")?;
        let num_states = parse_count(number, &line, "num_states")?;
        let (number, line) = next_line("control count")?;
        let num_controls = parse_count(number, &line, "num_controls")?;

        let (number, line) = next_line("header")?;
        let mut header = line.trim_end().split(',');
        if header.next() != Some("time") {
            return Err(TableError::parse(number, "header must start with `time`"));
        }
        let names: Vec<&str> = header.collect();
        let width = 1 + num_states + num_controls;
        if names.len() + 1 != width {
            return Err(TableError::parse(
                number,
                format!(
                    "header has {} columns, but {width} were declared",
                    names.len() + 1
                ),
            ));
        }
        let (state_names, control_names) = names.split_at(num_states);
        let state_names: Vec<String> = state_names.iter().map(|&s| s.to_owned()).collect();
        let control_names: Vec<String> = control_names.iter().map(|&s| s.to_owned()).collect();

        let mut samples: Vec<Vec<f64>> = Vec::new();
        for (number, line) in lines {
            let line = line?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let row = line
                .split(',')
                .map(|field| {
                    field.trim().parse::<f64>().map_err(|err| {
                        TableError::parse(number, format!("invalid value `{field}`: {err}"))
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;
            if row.len() != width {
                return Err(TableError::parse(
                    number,
                    format!("expected {width} values, but found {}", row.len()),
                ));
            }
            samples.push(row);
        }

        let n = samples.len();
        let time = DVector::from_iterator(n, samples.iter().map(|row| row[0]));
        let states = DMatrix::from_fn(num_states, n, |r, c| samples[c][1 + r]);
        let controls = DMatrix::from_fn(num_controls, n, |r, c| samples[c][1 + num_states + r]);

        Ok(Self::from_parts(time, states, controls, state_names, control_names))
    }
}

fn parse_count(number: usize, line: &str, key: &str) -> Result<usize, TableError> {
    let value = line
        .trim_end()
        .strip_prefix(key)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or_else(|| TableError::parse(number, format!("expected `{key}=<count>`")))?;
    value
        .parse()
        .map_err(|err| TableError::parse(number, format!("invalid {key} `{value}`: {err}")))
}
