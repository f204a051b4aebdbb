/// The literal token that starts pass-through arguments
pub const PASS_THROUGH_MARKER: &str = "--";

/// Flatten raw process arguments into the token list the classifier reads.
///
/// `launcher_entries` leading entries are dropped: 1 for a native binary's own
/// path, 2 when an interpreter and a script precede the real arguments.
/// `--name=value` becomes `--name value`; an empty value is dropped. Tokens after
/// a bare `--` are left untouched.
#[must_use]
pub fn standardize<I, S>(raw: I, launcher_entries: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut tokens = Vec::new();
    let mut passing_through = false;
    for arg in raw.into_iter().skip(launcher_entries).map(Into::into) {
        if passing_through {
            tokens.push(arg);
            continue;
        }
        if arg == PASS_THROUGH_MARKER {
            passing_through = true;
            tokens.push(arg);
            continue;
        }
        match arg.split_once('=') {
            Some((name, value)) if name.starts_with("--") => {
                tokens.push(name.to_string());
                if !value.is_empty() {
                    tokens.push(value.to_string());
                }
            }
            _ => tokens.push(arg),
        }
    }
    tokens
}

/// Standardize the current process's arguments
#[must_use]
pub fn from_env() -> Vec<String> {
    standardize(std::env::args(), 1)
}
