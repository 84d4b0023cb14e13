use pudding_settings::Settings;

pub mod logging;

pub fn print_launch(settings: &Settings) {
    use nu_ansi_term::{Color, Style};

    let ascii_art = r"
d8888b. db    db d8888b. d8888b. d888888b d8b   db  d888b
88  `8D 88    88 88  `8D 88  `8D   `88'   888o  88 88' Y8b
88oodD' 88    88 88   88 88   88    88    88V8o 88 88
88~~~   88    88 88   88 88   88    88    88 V8o88 88  ooo
88      88b  d88 88  .8D 88  .8D   .88.   88  V888 88. ~8~
88      ~Y8888P' Y8888D' Y8888D' Y888888P VP   V8P  Y888P
";

    let header = Style::new().bold();
    let ascii_art = Style::new().fg(Color::LightMagenta).paint(ascii_art);

    eprintln!("{ascii_art}");
    eprintln!(
        "{}:\t{}",
        header.paint("Version"),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();

    if let Some(path) = settings.path() {
        eprintln!("{}:\t{}", header.paint("Settings file"), path.display());
    } else {
        eprintln!("{}:\t<none>", header.paint("Settings file"));
    }
    eprintln!(
        "{}:\t{}",
        header.paint("Exchange"),
        settings.broker().exchange()
    );
    eprintln!("{}:\t{}", header.paint("Threads"), settings.threads());
    eprintln!();
}
