use std::io::Write;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, LevelFilter};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::time::Instant;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::fetcher::{FetchOptions, Fetcher, RecordSource, DEFAULT_DATASET_URL};
use crate::output::{self, OutputFormat};
use crate::paginator::{Navigation, DEFAULT_PAGE_SIZE};
use crate::render;
use crate::view::command::{Command, HELP};
use crate::view::{FundingTable, ViewState};

const SPINNER_TICK: Duration = Duration::from_millis(120);

fn print_banner() {
    const BANNER: &str = r#"
    ____                 __ __       __    __
   / __/_  ______  ____/ // /_____ _/ /_  / /__
  / /_/ / / / __ \/ __  // __/ __ `/ __ \/ / _ \
 / __/ /_/ / / / / /_/ // /_/ /_/ / /_/ / /  __/
/_/  \__,_/_/ /_/\__,_/ \__/\__,_/_.___/_/\___/
       crowdfunding dataset viewer
    "#;
    print!("{}", BANNER);
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[derive(Clone, Debug, PartialEq)]
struct RunConfig {
    url: String,
    page_size: usize,
    start_page: Option<usize>,
    timeout: usize,
    proxy: Option<String>,
    header: Option<String>,
    follow_redirects: bool,
    no_color: bool,
    verbose: u8,
    once: bool,
    output: Option<String>,
    output_format: Option<OutputFormat>,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let url = args
        .url
        .or(cfg.url)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_DATASET_URL.to_string());

    let page_size = args.page_size.or(cfg.page_size).unwrap_or(DEFAULT_PAGE_SIZE);
    crate::utils::parse_positive(page_size, "page-size")?;

    let start_page = args.page.or(cfg.page);
    if let Some(page) = start_page {
        crate::utils::parse_positive(page, "page")?;
    }

    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10);
    crate::utils::parse_positive(timeout, "timeout")?;

    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());
    let header = args.header.or(cfg.header).filter(|h| !h.trim().is_empty());
    if let Some(raw) = header.as_deref() {
        crate::utils::parse_header(raw).map_err(|e| format!("invalid header '{raw}': {e}"))?;
    }
    let follow_redirects = args
        .follow_redirects
        .or(cfg.follow_redirects)
        .unwrap_or(true);

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => Some(
            OutputFormat::parse(&raw)
                .ok_or_else(|| format!("invalid output format '{raw}'"))?,
        ),
        None => None,
    };

    Ok(RunConfig {
        url,
        page_size,
        start_page,
        timeout,
        proxy,
        header,
        follow_redirects,
        no_color,
        verbose: args.verbose,
        once: args.once,
        output,
        output_format,
    })
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = env_logger::Builder::new()
        .filter(None, LevelFilter::Warn)
        .filter(Some("fundtable"), level)
        .try_init();
}

enum Step {
    Continue(String),
    Quit,
}

fn handle_line(table: &mut FundingTable, line: &str) -> Step {
    match Command::parse(line) {
        Ok(Command::Quit) => Step::Quit,
        Ok(Command::Help) => Step::Continue(format!("{HELP}\n")),
        Ok(Command::Navigate(action)) => {
            let page = table.navigate(action);
            debug!("navigated to page {page} via {action:?}");
            Step::Continue(render::render_view(&table.state()))
        }
        Err(e) => Step::Continue(format!(":: {e} (type h for help)\n")),
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

async fn interact(table: &mut FundingTable) -> Result<(), String> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| format!("failed to read command: {e}"))?
    {
        if line.trim().is_empty() {
            prompt();
            continue;
        }
        match handle_line(table, &line) {
            Step::Quit => break,
            Step::Continue(out) => print!("{out}"),
        }
        prompt();
    }
    println!();
    Ok(())
}

fn resolve_output_format(path: &str, format: Option<OutputFormat>) -> OutputFormat {
    format
        .or_else(|| output::infer_format_from_path(path))
        .unwrap_or(OutputFormat::Text)
}

async fn write_output(
    table: &FundingTable,
    path: &str,
    format: Option<OutputFormat>,
) -> Result<(), String> {
    let format = resolve_output_format(path, format);
    let rendered = output::render(format, &table.page(), table.error())
        .map_err(|e| format!("failed to serialize output: {e}"))?;

    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(&rendered)
        .await
        .map_err(|_| "failed to write output file".to_string())?;
    Ok(())
}

fn loading_message() -> String {
    render::render_view(&ViewState::Loading).trim_end().to_string()
}

/// Mounts the table, ticking the spinner whenever its loading flag is up.
async fn mount_with_spinner<S: RecordSource>(
    table: &mut FundingTable,
    source: &S,
    pb: &ProgressBar,
) -> bool {
    let flag = table.loading_flag();
    let mount = table.mount(source);
    tokio::pin!(mount);
    let mut ticker = tokio::time::interval(SPINNER_TICK);
    let mounted = loop {
        tokio::select! {
            mounted = &mut mount => break mounted,
            _ = ticker.tick() => {
                if flag.is_raised() {
                    pb.set_message(loading_message());
                    pb.tick();
                }
            }
        }
    };
    pb.finish_and_clear();
    mounted
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_banner();

    format_kv_line("Dataset", &run.url);
    format_kv_line("Page size", &run.page_size.to_string());
    format_kv_line("Timeout", &format!("{}s", run.timeout));
    if let Some(proxy) = run.proxy.as_deref() {
        format_kv_line("Proxy", proxy);
    }
    format_kv_line("Redirects", format_bool(run.follow_redirects));
    if let Some(path) = run.output.as_deref() {
        format_kv_line("Output", path);
    }
    if run.verbose > 0 {
        format_kv_line("Verbosity", &run.verbose.to_string());
    }
    println!();

    let fetcher = Fetcher::new(FetchOptions {
        url: run.url.clone(),
        timeout_seconds: run.timeout,
        proxy: run.proxy.clone(),
        header: run.header.clone(),
        follow_redirects: run.follow_redirects,
    })
    .map_err(|e| e.to_string())?;

    let mut table = FundingTable::new(run.page_size);

    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg} [{elapsed}]")
            .map_err(|e| format!("failed to build spinner style: {e}"))?,
    );

    let now = Instant::now();
    mount_with_spinner(&mut table, &fetcher, &pb).await;
    debug!("fetch settled after {}ms", now.elapsed().as_millis());

    if let Some(page) = run.start_page {
        table.navigate(Navigation::Goto(page));
    }
    print!("{}", render::render_view(&table.state()));

    if !run.once {
        interact(&mut table).await?;
    }

    if let Some(path) = run.output.as_deref() {
        write_output(&table, path, run.output_format).await?;
        println!(":: Saved page {} to {}", table.current_page(), path);
    }

    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_logging(args.verbose);

    if args.init_config {
        let path = match args.config.as_deref() {
            Some(path) => config::expand_tilde(path),
            None => config::default_config_path()
                .ok_or_else(|| "could not determine home directory".to_string())?,
        };
        config::ensure_default_config_file(&path)?;
        println!(":: Config written to {}", path.display());
        return Ok(());
    }

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    debug!("run config: {run:?}");

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use crate::fetcher::{FetchError, LoadingFlag};
    use crate::model::Record;

    fn parse(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["fundtable"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    struct Fixed(usize);

    impl RecordSource for Fixed {
        async fn fetch_records(&self) -> Result<Vec<Record>, FetchError> {
            Ok((0..self.0)
                .map(|i| Record::new(i as i64, i as f64, i as f64))
                .collect())
        }
    }

    #[test]
    fn defaults_without_config() {
        let run = build_run_config(parse(&[]), ConfigFile::default()).unwrap();
        assert_eq!(run.url, DEFAULT_DATASET_URL);
        assert_eq!(run.page_size, 5);
        assert_eq!(run.start_page, None);
        assert_eq!(run.timeout, 10);
        assert!(run.follow_redirects);
        assert!(!run.no_color);
        assert!(!run.once);
        assert_eq!(run.output_format, None);
    }

    #[test]
    fn cli_overrides_config() {
        let cfg = ConfigFile {
            url: Some("http://config.local/data.json".to_string()),
            page_size: Some(8),
            timeout: Some(30),
            no_color: Some(true),
            follow_redirects: Some(false),
            ..ConfigFile::default()
        };
        let run = build_run_config(
            parse(&["-u", "http://cli.local/data.json", "-z", "3", "--color"]),
            cfg,
        )
        .unwrap();
        assert_eq!(run.url, "http://cli.local/data.json");
        assert_eq!(run.page_size, 3);
        assert_eq!(run.timeout, 30);
        assert!(!run.no_color);
        assert!(!run.follow_redirects);
    }

    #[test]
    fn config_values_are_validated() {
        let cfg = ConfigFile {
            page_size: Some(0),
            ..ConfigFile::default()
        };
        assert!(build_run_config(parse(&[]), cfg).is_err());

        let cfg = ConfigFile {
            output_format: Some("pdf".to_string()),
            ..ConfigFile::default()
        };
        assert!(build_run_config(parse(&[]), cfg).is_err());
    }

    #[test]
    fn output_format_falls_back_to_extension_then_text() {
        assert_eq!(
            resolve_output_format("page.json", None),
            OutputFormat::Json
        );
        assert_eq!(
            resolve_output_format("page.json", Some(OutputFormat::Html)),
            OutputFormat::Html
        );
        assert_eq!(resolve_output_format("page", None), OutputFormat::Text);
    }

    #[tokio::test]
    async fn lines_drive_the_table() {
        colored::control::set_override(false);
        let mut table = FundingTable::new(5);
        table.mount(&Fixed(23)).await;

        match handle_line(&mut table, "next") {
            Step::Continue(out) => assert!(out.contains("Page 2 of 5")),
            Step::Quit => panic!("unexpected quit"),
        }
        match handle_line(&mut table, "9") {
            Step::Continue(out) => assert!(out.contains("Page 5 of 5")),
            Step::Quit => panic!("unexpected quit"),
        }
        match handle_line(&mut table, "bogus") {
            Step::Continue(out) => assert!(out.contains("unknown command")),
            Step::Quit => panic!("unexpected quit"),
        }
        assert_eq!(table.current_page(), 5);
        assert!(matches!(handle_line(&mut table, "q"), Step::Quit));
    }

    #[tokio::test]
    async fn writes_selected_page_to_file() {
        let mut table = FundingTable::new(5);
        table.mount(&Fixed(12)).await;
        table.navigate(Navigation::Last);

        let path = std::env::temp_dir().join(format!("fundtable-out-{}.json", std::process::id()));
        let path_str = path.to_string_lossy().to_string();
        write_output(&table, &path_str, None).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["page"], 3);
        assert_eq!(value["records"].as_array().unwrap().len(), 2);
        let _ = std::fs::remove_file(&path);
    }

    struct Slow(LoadingFlag, Arc<AtomicBool>);

    impl RecordSource for Slow {
        async fn fetch_records(&self) -> Result<Vec<Record>, FetchError> {
            self.1.store(self.0.is_raised(), Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(400)).await;
            Ok(vec![Record::new(1, 10.0, 20.0)])
        }
    }

    #[tokio::test]
    async fn spinner_follows_loading_flag() {
        let mut table = FundingTable::new(5);
        let saw_flag = Arc::new(AtomicBool::new(false));
        let source = Slow(table.loading_flag(), saw_flag.clone());
        let pb = ProgressBar::hidden();
        pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());

        assert!(mount_with_spinner(&mut table, &source, &pb).await);
        assert!(saw_flag.load(Ordering::SeqCst));
        assert_eq!(pb.message(), loading_message());
        assert!(pb.is_finished());
        assert!(!table.is_loading());
        assert_eq!(table.records().len(), 1);
    }

    #[tokio::test]
    async fn failed_table_exports_error_kind_as_text() {
        colored::control::set_override(false);
        let mut table = FundingTable::new(5);
        let res = tokio::time::timeout(
            Duration::from_millis(20),
            table.mount(&Slow(LoadingFlag::new(), Arc::new(AtomicBool::new(false)))),
        )
        .await;
        assert!(res.is_err());

        let path = std::env::temp_dir().join(format!("fundtable-out-{}.txt", std::process::id()));
        let path_str = path.to_string_lossy().to_string();
        write_output(&table, &path_str, None).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, render::render_view(&table.state()));
        assert!(text.starts_with("[ERR] network error: fetch was dropped"));
        let _ = std::fs::remove_file(&path);
    }
}
