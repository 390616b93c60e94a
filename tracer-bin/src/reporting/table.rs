use std::fmt::{self, Display, Formatter};

/// Left-aligned text table with a rule between every row. Cells may span
/// several lines.
#[derive(Debug, Clone, Default)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(header: I) -> Table
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    fn columns(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.len())
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.columns()];
        for row in std::iter::once(&self.header).chain(self.rows.iter()) {
            for (i, cell) in row.iter().enumerate() {
                let w = cell.lines().map(|l| l.chars().count()).max().unwrap_or(0);
                widths[i] = widths[i].max(w);
            }
        }
        widths
    }
}

fn rule(f: &mut Formatter, widths: &[usize]) -> fmt::Result {
    for w in widths {
        write!(f, "+{}", "-".repeat(w + 2))?;
    }
    writeln!(f, "+")
}

fn row(f: &mut Formatter, widths: &[usize], cells: &[String]) -> fmt::Result {
    let split: Vec<Vec<&str>> = widths
        .iter()
        .enumerate()
        .map(|(i, _)| cells.get(i).map(|c| c.lines().collect()).unwrap_or_default())
        .collect();
    let height = split.iter().map(|l| l.len()).max().unwrap_or(0).max(1);
    for line in 0..height {
        for (i, w) in widths.iter().enumerate() {
            let text = split[i].get(line).copied().unwrap_or("");
            write!(f, "| {:<width$} ", text, width = *w)?;
        }
        writeln!(f, "|")?;
    }
    Ok(())
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let widths = self.widths();
        rule(f, &widths)?;
        row(f, &widths, &self.header)?;
        rule(f, &widths)?;
        for r in &self.rows {
            row(f, &widths, r)?;
            rule(f, &widths)?;
        }
        Ok(())
    }
}
