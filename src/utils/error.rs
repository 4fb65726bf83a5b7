/// Compact a transport/provider error message for single-line logging.
/// Collapses whitespace runs and truncates oversized payload dumps.
pub fn compact_error_message(message: &str, max_len: usize) -> String {
    let mut compact = String::with_capacity(message.len().min(max_len.saturating_add(16)));
    let mut prev_ws = false;
    for ch in message.chars() {
        if ch.is_whitespace() {
            if !prev_ws && !compact.is_empty() {
                compact.push(' ');
            }
            prev_ws = true;
            continue;
        }
        compact.push(ch);
        prev_ws = false;
        if compact.len() > max_len {
            break;
        }
    }
    if compact.len() <= max_len {
        compact
    } else {
        compact.truncate(max_len);
        compact.push_str("...(truncated)");
        compact
    }
}
