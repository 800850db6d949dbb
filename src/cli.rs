//! Line-oriented front end. Plain lines replace the text; lines starting with `:` are
//! commands.

use crate::color::Color;
use crate::controller::Edit;
use crate::export::ExportFormat;
use crate::logo::LogoSpec;
use crate::metadata::{check_margin, ECLevel, PixelSize, StyleKind};

pub const HELP: &str = "\
Type text or a URL to encode it. Commands:
  :dark <#hex>            module color
  :light <#hex>           background color
  :size <200|256|320|400> preview size
  :margin <n>             quiet zone in modules
  :ec <L|M|Q|H>           error correction level
  :style <square|rounded|extra-rounded|dots>
  :logo <path> [size% [x% y%]]
  :nologo                 remove the logo
  :show                   print the current code
  :export <png|svg>       save the code and record it in history
  :history                list exported codes
  :restore <id>           load a history entry
  :rm <id>                remove a history entry
  :clear-history          remove all history entries
  :help                   this text
  :quit                   exit";

#[derive(Debug)]
pub enum Input {
    Edit(Edit),
    Show,
    Export(ExportFormat),
    History,
    Restore(String),
    Remove(String),
    ClearHistory,
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<Input, String> {
    let Some(cmd) = line.strip_prefix(':') else {
        return Ok(Input::Edit(Edit::Text(line.to_string())));
    };

    let mut args = cmd.split_whitespace();
    let name = args.next().unwrap_or_default();
    let mut arg = |what: &str| args.next().ok_or_else(|| format!(":{name} expects {what}"));

    let input = match name {
        "dark" => Input::Edit(Edit::Dark(Color::parse(arg("a color")?).map_err(|e| e.to_string())?)),
        "light" => Input::Edit(Edit::Light(Color::parse(arg("a color")?).map_err(|e| e.to_string())?)),
        "size" => {
            let px = arg("a pixel size")?.parse::<u32>().map_err(|e| e.to_string())?;
            Input::Edit(Edit::PixelSize(PixelSize::try_from(px)?))
        }
        "margin" => {
            let margin = arg("a number")?.parse().map_err(|_| "margin must be a number")?;
            Input::Edit(Edit::Margin(check_margin(margin).map_err(|e| e.to_string())?))
        }
        "ec" => Input::Edit(Edit::ECLevel(arg("a level")?.parse::<ECLevel>()?)),
        "style" => Input::Edit(Edit::Style(arg("a style")?.parse::<StyleKind>()?)),
        "logo" => Input::Edit(Edit::Logo(Some(parse_logo(cmd)?))),
        "nologo" => Input::Edit(Edit::Logo(None)),
        "show" => Input::Show,
        "export" => Input::Export(arg("a format")?.parse()?),
        "history" => Input::History,
        "restore" => Input::Restore(arg("an id")?.to_string()),
        "rm" => Input::Remove(arg("an id")?.to_string()),
        "clear-history" => Input::ClearHistory,
        "help" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        _ => return Err(format!("unknown command :{name}, try :help")),
    };
    Ok(input)
}

fn parse_logo(cmd: &str) -> Result<LogoSpec, String> {
    let mut args = cmd.split_whitespace().skip(1);
    let path = args.next().ok_or(":logo expects a path")?;
    let nums = args
        .map(|a| a.trim_end_matches('%').parse::<u8>().map_err(|_| format!("not a percentage: {a}")))
        .collect::<Result<Vec<_>, _>>()?;

    let mut logo = LogoSpec::from_file(path).map_err(|e| e.to_string())?;
    if let Some(&size) = nums.first() {
        logo = logo.with_size(size).map_err(|e| e.to_string())?;
    }
    match nums[..] {
        [_] | [] => {}
        [_, x, y] => logo = logo.with_position(x, y).map_err(|e| e.to_string())?,
        _ => return Err(":logo expects <path> [size% [x% y%]]".to_string()),
    }
    Ok(logo)
}

#[cfg(test)]
mod cli_tests {
    use test_case::test_case;

    use super::{parse, Input};
    use crate::color::Color;
    use crate::controller::Edit;
    use crate::export::ExportFormat;
    use crate::metadata::{ECLevel, PixelSize, StyleKind};

    #[test]
    fn test_plain_text_is_edit() {
        assert!(matches!(parse("https://example.com"), Ok(Input::Edit(Edit::Text(t))) if t == "https://example.com"));
        assert!(matches!(parse(""), Ok(Input::Edit(Edit::Text(t))) if t.is_empty()));
    }

    #[test]
    fn test_settings_commands() {
        assert!(matches!(parse(":dark #000"), Ok(Input::Edit(Edit::Dark(c))) if c == Color::BLACK));
        assert!(matches!(parse(":size 400"), Ok(Input::Edit(Edit::PixelSize(PixelSize::Px400)))));
        assert!(matches!(parse(":margin 4"), Ok(Input::Edit(Edit::Margin(4)))));
        assert!(matches!(parse(":ec h"), Ok(Input::Edit(Edit::ECLevel(ECLevel::H)))));
        assert!(matches!(parse(":style extra-rounded"), Ok(Input::Edit(Edit::Style(StyleKind::ExtraRounded)))));
        assert!(matches!(parse(":export svg"), Ok(Input::Export(ExportFormat::Svg))));
        assert!(matches!(parse(":restore abc"), Ok(Input::Restore(id)) if id == "abc"));
    }

    #[test_case(":dark red"; "malformed color")]
    #[test_case(":size 300"; "unsupported size")]
    #[test_case(":margin x"; "bad margin")]
    #[test_case(":margin 65"; "margin too wide")]
    #[test_case(":margin 4294967295"; "margin at u32 max")]
    #[test_case(":style wavy"; "unknown style")]
    #[test_case(":export"; "missing format")]
    #[test_case(":logo"; "missing path")]
    #[test_case(":logo /definitely/missing.png"; "missing file")]
    #[test_case(":frobnicate"; "unknown command")]
    fn test_rejected(line: &str) {
        assert!(parse(line).is_err());
    }

    #[test]
    fn test_logo_with_percentages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, crate::logo::logo_tests::png_bytes(4, 4, [0, 0, 0, 255])).unwrap();

        let line = format!(":logo {} 30% 25 75", path.display());
        let Ok(Input::Edit(Edit::Logo(Some(logo)))) = parse(&line) else { panic!("expected a logo") };
        assert_eq!(logo.size_percent(), 30);
        assert_eq!(logo.position_percent(), (25, 75));

        assert!(parse(&format!(":logo {} 30 25", path.display())).is_err());
        assert!(parse(&format!(":logo {} 50", path.display())).is_err());
    }
}
