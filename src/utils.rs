/// Maps a 1-based line and byte column, as reported by `serde_json`, to a byte
/// offset into `source`. The result is clamped to the end of that line and
/// moved back onto a char boundary.
pub fn get_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start = if line <= 1 {
        0
    } else {
        match source.match_indices('\n').nth(line - 2) {
            Some((newline, _)) => newline + 1,
            None => return source.len(),
        }
    };
    let line_end = source[line_start..]
        .find('\n')
        .map_or(source.len(), |end| line_start + end);

    let mut offset = (line_start + column.saturating_sub(1)).min(line_end);
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
