// SPDX-License-Identifier: MIT

//! `%`-expansion of printcap string values (spec §4.2 step 8).

/// Substitution values for the fixed key-letter map (spec §4.2 step 8:
/// "`%P`→printer, `%h`→short host, `%H`→FQDN, `%R`→remote printer,
/// `%M`→remote host, `%D`→date, …").
#[derive(Debug, Clone, Default)]
pub struct ExpansionContext {
    pub printer: String,
    pub short_host: String,
    pub fqdn: String,
    pub remote_printer: Option<String>,
    pub remote_host: Option<String>,
    pub date: String,
}

impl ExpansionContext {
    fn lookup(&self, letter: char) -> Option<&str> {
        match letter {
            'P' => Some(&self.printer),
            'h' => Some(&self.short_host),
            'H' => Some(&self.fqdn),
            'R' => self.remote_printer.as_deref(),
            'M' => self.remote_host.as_deref(),
            'D' => Some(&self.date),
            _ => None,
        }
    }
}

/// Expand every `%X` occurrence in `value` using `ctx`. `%%` is a literal
/// `%`; an unrecognized `%X` (or one whose value is unset) is left as-is.
pub fn expand(value: &str, ctx: &ExpansionContext) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                out.push('%');
                chars.next();
            }
            Some(letter) => match ctx.lookup(letter) {
                Some(replacement) => {
                    out.push_str(replacement);
                    chars.next();
                }
                None => {
                    out.push('%');
                }
            },
            None => out.push('%'),
        }
    }
    out
}
