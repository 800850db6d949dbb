use std::error::Error;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};

use qrkit::cli::{self, Input, HELP};
use qrkit::{Command, Controller, DirSaver, FileStore, Matrix, QrCodeProvider, Settings, TextStatus};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let (settings, settings_note) = Settings::load();

    // stdout is the UI, so logs go to a file
    let file_appender = tracing_appender::rolling::daily(&settings.log_dir, "qrkit.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_max_level(settings.tracing_level())
        .init();

    tracing::info!("Starting qrkit...");
    if let Some(note) = settings_note {
        tracing::info!("{note}");
    }
    tracing::info!("run with settings: {:?}", settings);

    let store = FileStore::open(&settings.data_dir)?;
    let mut controller = Controller::new(QrCodeProvider, store, DirSaver::new(&settings.export_dir));

    let (tx, rx) = mpsc::channel(32);
    let input = tokio::spawn(read_input(tx));

    controller.run(rx).await;
    input.await??;

    tracing::info!("Bye");
    Ok(())
}

async fn read_input(tx: mpsc::Sender<Command>) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("qrkit. Type text to encode, :help for commands.");
    show(&tx).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match cli::parse(&line) {
            Ok(input) => input,
            Err(e) => {
                println!("! {e}");
                continue;
            }
        };

        match input {
            Input::Edit(edit) => {
                if let qrkit::Edit::Text(text) = &edit {
                    let status = TextStatus::of(text);
                    println!("{status}");
                    if let Some(notice) = status.notice() {
                        println!("! {notice}");
                    }
                }
                tx.send(Command::Edit(edit)).await?;
            }
            Input::Show => show(&tx).await?,
            Input::Export(format) => {
                let (reply, res) = oneshot::channel();
                tx.send(Command::Export { format, reply }).await?;
                match res.await? {
                    Ok(path) => println!("saved {}", path.display()),
                    Err(e) => println!("! {e}"),
                }
            }
            Input::History => {
                let (reply, res) = oneshot::channel();
                tx.send(Command::History(reply)).await?;
                let entries = res.await?;
                if entries.is_empty() {
                    println!("(no history)");
                }
                for e in entries {
                    let text: String = e.text.chars().take(40).collect();
                    println!(
                        "{}  {}  {:?}/{}/{}  {text}",
                        e.id,
                        e.created_at.format("%Y-%m-%d %H:%M:%S"),
                        e.config.ec_level,
                        e.config.pixel_size.px(),
                        e.config.style,
                    );
                }
            }
            Input::Restore(id) => {
                let (reply, res) = oneshot::channel();
                tx.send(Command::Restore { id, reply }).await?;
                if !res.await? {
                    println!("! no such entry");
                }
            }
            Input::Remove(id) => {
                let (reply, res) = oneshot::channel();
                tx.send(Command::RemoveHistory { id, reply }).await?;
                match res.await? {
                    Ok(true) => println!("removed"),
                    Ok(false) => println!("! no such entry"),
                    Err(e) => println!("! {e}"),
                }
            }
            Input::ClearHistory => {
                let (reply, res) = oneshot::channel();
                tx.send(Command::ClearHistory(reply)).await?;
                if let Err(e) = res.await? {
                    println!("! {e}");
                }
            }
            Input::Help => println!("{HELP}"),
            Input::Quit => break,
        }
    }
    Ok(())
}

async fn show(tx: &mpsc::Sender<Command>) -> Result<(), Box<dyn Error + Send + Sync>> {
    let (reply, res) = oneshot::channel();
    tx.send(Command::Snapshot(reply)).await?;
    let snapshot = res.await?;

    if snapshot.pending {
        println!("(rendering...)");
    }
    if let Some(e) = &snapshot.error {
        println!("! {e}");
    }
    match &snapshot.rendered {
        Some(req) => match Matrix::encode(req.effective_text(), req.config.ec_level) {
            Ok(m) => print!("{}", m.to_str(2)),
            Err(e) => println!("! {e}"),
        },
        None if snapshot.error.is_none() => println!("(enter text to generate a QR code)"),
        None => {}
    }
    println!(
        "{}  dark {} light {} {}px margin {} ec {:?} style {}{}",
        snapshot.status,
        snapshot.config.dark,
        snapshot.config.light,
        snapshot.config.pixel_size.px(),
        snapshot.config.margin,
        snapshot.config.ec_level,
        snapshot.config.style,
        if snapshot.has_logo { " +logo" } else { "" },
    );
    Ok(())
}
