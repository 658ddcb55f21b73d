//! # qrforge CLI
//!
//! Command-line interface for generating, exporting and scanning codes.
//!
//! ## Usage
//!
//! ```bash
//! # Serve the web UI and JSON API
//! qrforge serve --listen 0.0.0.0:8080 --base-path /QR-Barcode-Generator
//!
//! # Wi-Fi QR code as PDF
//! qrforge qr --output wifi.pdf wifi --ssid Home --password secret1
//!
//! # EAN-13 barcode
//! qrforge barcode --format EAN13 400638133393
//!
//! # Decode images
//! qrforge scan photo.jpg screenshot.png
//!
//! # One code per line of a file
//! qrforge batch --type qr --input links.txt --out-dir codes/
//!
//! # Copy a history entry to the clipboard, or save it with WhatsApp links
//! qrforge share <id> --copy
//! qrforge share <id> --out-dir shared/
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use qrforge::{
    CodeKind, QrForgeError, QrPayload,
    batch::{self, BatchItem, DOWNLOAD_PAUSE},
    config::{DEFAULT_DATA_DIR, DEFAULT_LISTEN, ServerConfig, StorageConfig},
    data_url::DataUrl,
    export::{ArtifactSink, DirectorySink, ExportFormat, ExportJob, PageSize},
    generate::{generate_barcode, generate_qr},
    options::{
        BarcodeFormat, BarcodeOptionsPatch, ErrorCorrection, OptionsPatch, QrOptionsPatch,
    },
    payload::{
        CalendarEvent, ContactCard, EmailMessage, Escaping, GeoPoint, QrType, SmsMessage,
        WifiCredentials, WifiSecurity,
    },
    scan::{CameraScanner, ImageSequence, scan_image_bytes},
    server,
    share::{self, ShareOutcome, SystemClipboard},
    storage::{FileStore, HistoryLog, NewCode, TemplateStore},
};

/// qrforge - QR code and barcode generator and scanner
#[derive(Parser, Debug)]
#[command(name = "qrforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding history and templates
    #[arg(long, global = true, env = "QRFORGE_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the web UI and JSON API
    Serve {
        /// Address to listen on
        #[arg(long, env = "QRFORGE_LISTEN", default_value = DEFAULT_LISTEN)]
        listen: String,

        /// Mount point, e.g. /QR-Barcode-Generator
        #[arg(long, env = "QRFORGE_BASE_PATH", default_value = "")]
        base_path: String,
    },

    /// Generate a QR code
    Qr {
        #[command(subcommand)]
        payload: PayloadCommand,

        #[command(flatten)]
        style: QrStyle,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Generate a barcode
    Barcode {
        /// Data to encode
        data: String,

        #[arg(long, value_enum, default_value = "code128")]
        format: FormatArg,

        /// Width of one module in pixels
        #[arg(long)]
        module_width: Option<u32>,

        /// Bar height in pixels
        #[arg(long)]
        height: Option<u32>,

        /// Do not print the value under the bars
        #[arg(long)]
        hide_value: bool,

        #[arg(long)]
        font_size: Option<u32>,

        #[arg(long)]
        margin: Option<u32>,

        #[arg(long)]
        foreground: Option<String>,

        #[arg(long)]
        background: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Decode QR codes from image files
    Scan {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Treat the files as frames of one stream and stop at the first hit
        #[arg(long)]
        stream: bool,

        /// Frames per second in stream mode
        #[arg(long, default_value_t = qrforge::scan::DEFAULT_FPS)]
        fps: u32,
    },

    /// Show or edit the history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Show or edit saved option templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Generate one code per input line
    Batch {
        #[arg(long = "type", value_enum, default_value = "qr")]
        kind: KindArg,

        /// File with one item per line ("-" for stdin)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Items given inline
        items: Vec<String>,

        /// Options as JSON, e.g. '{"width":300}'
        #[arg(long)]
        options: Option<String>,

        #[arg(long, value_enum, default_value = "png")]
        format: BatchFormat,

        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Share a history entry: save the PNG and print WhatsApp links
    Share {
        /// History entry id (see `history list`)
        id: String,

        /// Copy the image to the clipboard instead
        #[arg(long)]
        copy: bool,

        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum PayloadCommand {
    /// A URL
    Url { url: String },
    /// Free text
    Text { text: String },
    /// Wi-Fi credentials
    Wifi {
        #[arg(long)]
        ssid: String,
        #[arg(long, default_value = "")]
        password: String,
        /// WPA, WEP or nopass
        #[arg(long, default_value = "WPA")]
        security: String,
        #[arg(long)]
        hidden: bool,
    },
    /// Contact card
    Vcard {
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        organization: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        website: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Email draft
    Email {
        to: String,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
    },
    /// SMS draft
    Sms {
        phone: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    /// Geographic point
    Geo {
        #[arg(allow_hyphen_values = true)]
        latitude: f64,
        #[arg(allow_hyphen_values = true)]
        longitude: f64,
    },
    /// Calendar event
    Event {
        #[arg(long)]
        title: String,
        /// RFC 3339 or local YYYY-MM-DDTHH:MM
        #[arg(long)]
        start: String,
        #[arg(long, default_value = "")]
        end: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// A payload as JSON: {"type": "...", "data": ...}
    Json { json: String },
}

#[derive(Args, Debug)]
struct QrStyle {
    /// Image size in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Quiet zone in modules
    #[arg(long)]
    margin: Option<u32>,

    #[arg(long)]
    dark: Option<String>,

    #[arg(long)]
    light: Option<String>,

    #[arg(long, value_enum)]
    error_correction: Option<EcArg>,

    /// Image file drawn in the centre
    #[arg(long)]
    logo: Option<PathBuf>,

    #[arg(long)]
    logo_size: Option<u32>,

    /// Escape reserved characters in payload fields
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output file; format follows the extension (png, jpg, svg, pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// PDF page size
    #[arg(long, value_enum, default_value = "a4")]
    page_size: PageArg,

    /// Do not record the code in history
    #[arg(long)]
    no_history: bool,
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List entries, newest first
    List,
    /// Remove one entry
    Remove { id: String },
    /// Remove every entry
    Clear,
}

#[derive(Subcommand, Debug)]
enum TemplateAction {
    /// List templates
    List,
    /// Save a template
    Save {
        name: String,
        #[arg(long = "type", value_enum, default_value = "qr")]
        kind: KindArg,
        /// Options as JSON, e.g. '{"darkColor":"#1e3a8a"}'
        #[arg(long, default_value = "{}")]
        options: String,
    },
    /// Delete a template
    Delete { id: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Qr,
    Barcode,
}

impl From<KindArg> for CodeKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Qr => CodeKind::Qr,
            KindArg::Barcode => CodeKind::Barcode,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Code128,
    Code39,
    Ean13,
    Ean8,
    Upc,
    Itf14,
}

impl From<FormatArg> for BarcodeFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Code128 => BarcodeFormat::Code128,
            FormatArg::Code39 => BarcodeFormat::Code39,
            FormatArg::Ean13 => BarcodeFormat::Ean13,
            FormatArg::Ean8 => BarcodeFormat::Ean8,
            FormatArg::Upc => BarcodeFormat::Upc,
            FormatArg::Itf14 => BarcodeFormat::Itf14,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EcArg {
    L,
    M,
    Q,
    H,
}

impl From<EcArg> for ErrorCorrection {
    fn from(arg: EcArg) -> Self {
        match arg {
            EcArg::L => ErrorCorrection::L,
            EcArg::M => ErrorCorrection::M,
            EcArg::Q => ErrorCorrection::Q,
            EcArg::H => ErrorCorrection::H,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PageArg {
    A4,
    Letter,
    A5,
}

impl From<PageArg> for PageSize {
    fn from(arg: PageArg) -> Self {
        match arg {
            PageArg::A4 => PageSize::A4,
            PageArg::Letter => PageSize::Letter,
            PageArg::A5 => PageSize::A5,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BatchFormat {
    Png,
    Pdf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), QrForgeError> {
    let cli = Cli::parse();
    let storage = StorageConfig::new(&cli.data_dir);

    match cli.command {
        Commands::Serve { listen, base_path } => {
            let config = ServerConfig::new(listen, storage).base_path(&base_path);
            tokio::runtime::Runtime::new()?.block_on(server::serve(config))?;
        }

        Commands::Qr {
            payload,
            style,
            output,
        } => {
            let payload = payload_from_command(payload)?;
            let escaping = if style.strict {
                Escaping::Strict
            } else {
                Escaping::Raw
            };
            let options = QrOptionsPatch {
                width: style.width,
                margin: style.margin,
                dark_color: style.dark,
                light_color: style.light,
                error_correction_level: style.error_correction.map(Into::into),
                logo: style.logo.as_deref().map(read_logo).transpose()?,
                logo_size: style.logo_size,
                logo_margin: None,
            };
            let options = (options != QrOptionsPatch::default()).then_some(options);

            let code = generate_qr(&payload, options.as_ref(), escaping)?;
            println!("{}", code.data);
            save_code(&storage, code, &output, options.unwrap_or_default())?;
        }

        Commands::Barcode {
            data,
            format,
            module_width,
            height,
            hide_value,
            font_size,
            margin,
            foreground,
            background,
            output,
        } => {
            let options = BarcodeOptionsPatch {
                format: Some(format.into()),
                width: module_width,
                height,
                display_value: hide_value.then_some(false),
                font_size,
                margin,
                foreground_color: foreground,
                background_color: background,
            };
            let code = generate_barcode(&data, Some(&options))?;
            save_code(&storage, code, &output, QrOptionsPatch::default())?;
        }

        Commands::Scan { files, stream, fps } => {
            if stream {
                let runtime = tokio::runtime::Runtime::new()?;
                let text = runtime.block_on(async {
                    let mut session = CameraScanner::new()
                        .fps(fps)
                        .start(ImageSequence::from_paths(files))
                        .await?;
                    let text = session.result().await;
                    session.stop().await;
                    Ok::<_, QrForgeError>(text)
                })?;
                match text {
                    Some(text) => print_scan(&text),
                    None => {
                        return Err(QrForgeError::Decode("No QR code found in stream".into()));
                    }
                }
            } else {
                let mut failures = 0;
                for file in &files {
                    match std::fs::read(file)
                        .map_err(QrForgeError::from)
                        .and_then(|bytes| scan_image_bytes(&bytes))
                    {
                        Ok(text) => {
                            if files.len() > 1 {
                                println!("{}:", file.display());
                            }
                            print_scan(&text);
                        }
                        Err(e) => {
                            eprintln!("{}: {}", file.display(), e);
                            failures += 1;
                        }
                    }
                }
                if failures == files.len() {
                    return Err(QrForgeError::Decode(
                        "Failed to scan QR code from image".into(),
                    ));
                }
            }
        }

        Commands::History { action } => {
            let mut store = storage.open();
            let mut history = HistoryLog::new(&mut store);
            match action {
                HistoryAction::List => {
                    let entries = history.get();
                    if entries.is_empty() {
                        println!("No history yet.");
                    }
                    for entry in entries {
                        let when = chrono::DateTime::from_timestamp_millis(entry.timestamp)
                            .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default();
                        let label = entry
                            .qr_type
                            .map(|t| t.as_str())
                            .unwrap_or(entry.kind.as_str());
                        println!("{}  {}  {:<12} {}", entry.id, when, label, entry.preview());
                    }
                }
                HistoryAction::Remove { id } => {
                    history.remove(&id)?;
                    println!("Removed {}", id);
                }
                HistoryAction::Clear => {
                    history.clear()?;
                    println!("History cleared.");
                }
            }
        }

        Commands::Templates { action } => {
            let mut store = storage.open();
            let mut templates = TemplateStore::new(&mut store);
            match action {
                TemplateAction::List => {
                    for t in templates.get() {
                        let options = serde_json::to_string(&t.options).unwrap_or_default();
                        println!("{}  {:<8} {}  {}", t.id, t.kind.as_str(), t.name, options);
                    }
                }
                TemplateAction::Save {
                    name,
                    kind,
                    options,
                } => {
                    let options = parse_options(&options)?;
                    let template = templates.save(&name, kind.into(), options)?;
                    println!("Template saved: {}", template.id);
                }
                TemplateAction::Delete { id } => {
                    templates.remove(&id)?;
                    println!("Deleted {}", id);
                }
            }
        }

        Commands::Batch {
            kind,
            input,
            items,
            options,
            format,
            out_dir,
        } => {
            let mut texts = items;
            if let Some(input) = input {
                texts.extend(read_lines(&input)?);
            }
            if texts.is_empty() {
                return Err(QrForgeError::Validation("No batch items given".into()));
            }
            let options = options.as_deref().map(parse_options).transpose()?;
            let kind = CodeKind::from(kind);

            let results = batch::generate_batch(kind, &BatchItem::numbered(texts), options.as_ref())?;
            let format = match format {
                BatchFormat::Png => ExportFormat::Png,
                BatchFormat::Pdf => ExportFormat::Pdf,
            };
            let mut sink = DirectorySink::new(&out_dir);
            let saved = batch::download_batch(kind, &results, format, &mut sink, DOWNLOAD_PAUSE)?;
            let failed = results.iter().filter(|r| matches!(r.outcome, batch::BatchOutcome::Failed { .. })).count();
            println!("Saved {} file(s) to {} ({} failed)", saved, out_dir.display(), failed);
        }

        Commands::Share { id, copy, out_dir } => {
            let mut store = storage.open();
            let entry = HistoryLog::new(&mut store)
                .get()
                .into_iter()
                .find(|e| e.id == id)
                .ok_or_else(|| QrForgeError::NotFound(format!("history entry {}", id)))?;
            let image = DataUrl::parse(&entry.image)?;

            if copy {
                let mut clipboard = SystemClipboard::open().ok();
                share::copy_to_clipboard(
                    &image,
                    clipboard.as_mut().map(|c| c as &mut dyn share::Clipboard),
                )?;
                println!("Copied to clipboard.");
            } else {
                let mut sink = DirectorySink::new(&out_dir);
                match share::share_code(entry.kind, &entry.data, &image, None, &mut sink)? {
                    ShareOutcome::Native => println!("Shared."),
                    ShareOutcome::Fallback {
                        saved_as,
                        web_url,
                        app_url,
                    } => {
                        println!("Saved {}", out_dir.join(saved_as).display());
                        println!("WhatsApp Web: {}", web_url);
                        println!("WhatsApp app: {}", app_url);
                    }
                }
            }
        }
    }

    Ok(())
}

fn payload_from_command(command: PayloadCommand) -> Result<QrPayload, QrForgeError> {
    Ok(match command {
        PayloadCommand::Url { url } => QrPayload::Url(url),
        PayloadCommand::Text { text } => QrPayload::Text(text),
        PayloadCommand::Wifi {
            ssid,
            password,
            security,
            hidden,
        } => QrPayload::Wifi(
            WifiCredentials::new(ssid, password, WifiSecurity::parse(&security)?).hidden(hidden),
        ),
        PayloadCommand::Vcard {
            first_name,
            last_name,
            organization,
            email,
            phone,
            website,
            address,
            note,
        } => QrPayload::Vcard(ContactCard {
            first_name,
            last_name,
            organization,
            email,
            phone,
            website,
            address,
            note,
        }),
        PayloadCommand::Email { to, subject, body } => QrPayload::Email(EmailMessage {
            email: to,
            subject,
            body,
        }),
        PayloadCommand::Sms { phone, message } => QrPayload::Sms(SmsMessage { phone, message }),
        PayloadCommand::Geo {
            latitude,
            longitude,
        } => QrPayload::Geolocation(GeoPoint::new(latitude, longitude)),
        PayloadCommand::Event {
            title,
            start,
            end,
            location,
            description,
        } => QrPayload::Event(CalendarEvent {
            title,
            start_date: start,
            end_date: end,
            location,
            description,
        }),
        PayloadCommand::Json { json } => serde_json::from_str(&json)
            .map_err(|e| QrForgeError::Validation(format!("Invalid payload JSON: {}", e)))?,
    })
}

/// Record `code` in history (unless disabled) and write the requested file.
fn save_code(
    storage: &StorageConfig,
    code: NewCode,
    output: &OutputArgs,
    qr_options: QrOptionsPatch,
) -> Result<(), QrForgeError> {
    let kind = code.kind;
    let image = DataUrl::parse(&code.image)?;
    let data = code.data.clone();

    if !output.no_history {
        let mut store: FileStore = storage.open();
        let entry = HistoryLog::new(&mut store).append(code)?;
        tracing::debug!(id = %entry.id, "recorded in history");
    }

    let format = match output.output.as_ref().and_then(|p| p.extension()) {
        Some(ext) => ExportFormat::parse(&ext.to_string_lossy())?,
        None => ExportFormat::Png,
    };
    let mut job = ExportJob::new(kind, image, data)
        .page_size(output.page_size.into())
        .qr_options(qr_options.resolve());

    let (dir, filename) = match &output.output {
        Some(path) => {
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            job = job.filename(name.clone());
            (dir, name)
        }
        None => (PathBuf::from("."), String::new()),
    };

    let artifact = job.render(format)?;
    let filename = if filename.is_empty() {
        artifact.filename.clone()
    } else {
        filename
    };
    DirectorySink::new(&dir).save(&filename, &artifact.bytes)?;
    println!("Saved to {}", dir.join(&filename).display());
    Ok(())
}

fn read_logo(path: &Path) -> Result<String, QrForgeError> {
    let bytes = std::fs::read(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(DataUrl::new(mime.essence_str(), bytes).to_string())
}

fn parse_options(json: &str) -> Result<OptionsPatch, QrForgeError> {
    serde_json::from_str(json)
        .map_err(|e| QrForgeError::Validation(format!("Invalid options JSON: {}", e)))
}

fn read_lines(path: &Path) -> Result<Vec<String>, QrForgeError> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(content.lines().map(str::to_string).collect())
}

fn print_scan(text: &str) {
    println!("[{}] {}", QrType::detect(text), text);
}
