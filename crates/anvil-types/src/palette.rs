/// Default body colors, cycled per new body in creation order.
pub const BODY_PALETTE: [&str; 6] = [
    "#6699cc", "#99cc99", "#cc9999", "#cccc99", "#cc99cc", "#99cccc",
];

/// Color for the nth body created without an explicit color.
pub fn palette_color(n: usize) -> &'static str {
    BODY_PALETTE[n % BODY_PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_cycles() {
        assert_eq!(palette_color(0), "#6699cc");
        assert_eq!(palette_color(5), "#99cccc");
        assert_eq!(palette_color(6), "#6699cc");
    }
}
