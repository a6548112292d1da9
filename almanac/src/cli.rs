use clap::Parser;
use smithay_client_toolkit::shell::wlr_layer::{Anchor, Layer};

#[derive(Parser, Debug)]
#[command(name = "almanac", version, about = "Wayland layer-shell calendar with a ticking clock")]
pub struct Cli {
    /// A sequence of 'l', 'r', 't' and 'b' to anchor to those edges
    #[arg(
        short, long, value_name = "EDGES", num_args = 0..=1, default_missing_value = "",
        overrides_with = "anchor",
    )]
    anchor: Option<String>,

    /// Disable layer-shell, create a normal shell surface instead
    #[arg(short, long)]
    no_layer_shell: bool,
}

impl Cli {
    pub fn options(&self) -> Options {
        Options {
            anchors: self.anchor.as_deref().map(Anchors::decode).unwrap_or_default(),
            layer: Layer::Top,
            layer_shell: !self.no_layer_shell,
        }
    }
}

/// Resolved once at startup, read-only afterwards.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub anchors: Anchors,
    pub layer: Layer,
    pub layer_shell: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchors {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Default for Anchors {
    fn default() -> Self {
        Self { left: false, right: true, top: false, bottom: true }
    }
}

impl Anchors {
    pub const NONE: Self = Self { left: false, right: false, top: false, bottom: false };

    /// Unknown characters are skipped; an empty string anchors to nothing.
    pub fn decode(edges: &str) -> Self {
        let mut anchors = Self::NONE;
        for c in edges.chars() {
            match c {
                'l' => anchors.left = true,
                'r' => anchors.right = true,
                't' => anchors.top = true,
                'b' => anchors.bottom = true,
                _ => {}
            }
        }
        anchors
    }
}

impl From<Anchors> for Anchor {
    fn from(a: Anchors) -> Self {
        let mut anchor = Anchor::empty();
        if a.left { anchor |= Anchor::LEFT; }
        if a.right { anchor |= Anchor::RIGHT; }
        if a.top { anchor |= Anchor::TOP; }
        if a.bottom { anchor |= Anchor::BOTTOM; }
        anchor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Options {
        let mut argv = vec!["almanac"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().options()
    }

    #[test]
    fn decode_sets_named_edges_only() {
        assert_eq!(Anchors::decode("lt"), Anchors { left: true, right: false, top: true, bottom: false });
        assert_eq!(Anchors::decode("rb"), Anchors::default());
        assert_eq!(Anchors::decode("lrtb"), Anchors { left: true, right: true, top: true, bottom: true });
    }

    #[test]
    fn decode_ignores_order_duplicates_and_junk() {
        assert_eq!(Anchors::decode("btbbx?"), Anchors::decode("tb"));
        assert_eq!(Anchors::decode("TLRB"), Anchors::NONE);
        assert_eq!(Anchors::decode("zz"), Anchors::NONE);
        assert_eq!(Anchors::decode(""), Anchors::NONE);
    }

    #[test]
    fn absent_flag_keeps_default_anchors() {
        let opts = parse(&[]);
        assert_eq!(opts.anchors, Anchors { left: false, right: true, top: false, bottom: true });
        assert!(opts.layer_shell);
        assert_eq!(opts.layer, Layer::Top);
    }

    #[test]
    fn bare_flag_clears_anchors() {
        assert_eq!(parse(&["--anchor"]).anchors, Anchors::NONE);
        assert_eq!(parse(&["-a"]).anchors, Anchors::NONE);
        assert_eq!(parse(&["--anchor="]).anchors, Anchors::NONE);
    }

    #[test]
    fn flag_value_replaces_default() {
        assert_eq!(parse(&["--anchor=t"]).anchors, Anchors { left: false, right: false, top: true, bottom: false });
        assert_eq!(parse(&["-a", "lr"]).anchors, Anchors { left: true, right: true, top: false, bottom: false });
    }

    #[test]
    fn last_anchor_flag_wins() {
        let bottom = Anchors { left: false, right: false, top: false, bottom: true };
        assert_eq!(parse(&["-a", "lt", "-a", "b"]).anchors, bottom);
        assert_eq!(parse(&["--anchor=l", "--anchor"]).anchors, Anchors::NONE);
        assert_eq!(parse(&["-a", "--anchor=rb"]).anchors, Anchors::default());
    }

    #[test]
    fn no_layer_shell_flag() {
        assert!(!parse(&["-n"]).layer_shell);
        assert!(!parse(&["--no-layer-shell", "--anchor=l"]).layer_shell);
    }

    #[test]
    fn unknown_flag_is_an_error() {
        assert!(Cli::try_parse_from(["almanac", "--bogus"]).is_err());
    }

    #[test]
    fn anchors_map_onto_layer_shell_bits() {
        assert_eq!(Anchor::from(Anchors::default()), Anchor::RIGHT | Anchor::BOTTOM);
        assert_eq!(Anchor::from(Anchors::NONE), Anchor::empty());
    }
}
