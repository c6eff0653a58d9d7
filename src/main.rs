use anyhow::{Context, Result, bail};
use loan_debugger::chat::{self, ChatMode, NebiusClient};
use loan_debugger::config::{AVAILABLE_MODELS, AppConfig};
use loan_debugger::training::{self, TrainingConfig};
use loan_debugger::{ArtifactPaths, PredictionService, RawInput, artifacts, bias};
use std::io::{self, Write};
use std::path::PathBuf;

const DEFAULT_CSV: &str = "assets/data/loan_data.csv";

const USAGE: &str = "usage:
  loan-debugger train [--csv PATH] [--force]
  loan-debugger predict [JSON]
  loan-debugger importance
  loan-debugger bias FIELD [JSON]
  loan-debugger chat [--local] [--model NAME] QUERY...";

/// Field prompts for interactive prediction, with the choices offered.
const PROMPTS: [(&str, &str); 11] = [
    ("gender", "Male/Female"),
    ("married", "Yes/No"),
    ("dependents", "0/1/2/3+"),
    ("education", "Graduate/Not Graduate"),
    ("self_employed", "Yes/No"),
    ("applicant_income", "number"),
    ("coapplicant_income", "number"),
    ("loan_amount", "number"),
    ("loan_amount_term", "months, e.g. 360"),
    ("credit_history", "0/1"),
    ("property_area", "Urban/Semiurban/Rural"),
];

fn main() -> Result<()> {
    init_tracing()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        println!("{USAGE}");
        return Ok(());
    };

    match command.as_str() {
        "train" => train(rest),
        "predict" => predict(rest),
        "importance" => importance(),
        "bias" => bias_probe(rest),
        "chat" => chat_once(rest),
        other => bail!("unknown command '{other}'\n{USAGE}"),
    }
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loan_debugger=info".into()),
        )
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}

fn load_service() -> PredictionService {
    PredictionService::from_artifacts(artifacts::load(&ArtifactPaths::default()))
}

fn train(args: &[String]) -> Result<()> {
    let mut csv = PathBuf::from(DEFAULT_CSV);
    let mut force = false;
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--csv" => csv = it.next().context("--csv needs a path")?.into(),
            "--force" => force = true,
            other => bail!("unexpected argument '{other}'"),
        }
    }

    let paths = ArtifactPaths::default();
    let config = TrainingConfig::default();
    if force {
        println!("🧠 Training model from {:?}...", csv);
        let trained = training::train_and_save(&csv, &paths, config)?;
        if let Some(acc) = trained.test_accuracy {
            println!("✅ Accuracy: {:.2}%", acc * 100.0);
        }
    } else {
        let loaded = training::load_or_train_if_stale(&csv, &paths, config)?;
        let columns = loaded
            .model
            .as_ref()
            .and_then(|m| m.schema.as_ref())
            .map_or(0, |s| s.len());
        println!(
            "📦 Model ready at {:?} ({columns} features, {} encoders)",
            paths.model,
            loaded.encoders.len()
        );
    }
    Ok(())
}

fn predict(args: &[String]) -> Result<()> {
    let service = load_service();

    if let Some(json) = args.first() {
        let input = RawInput::from_json(json)?;
        println!("{}", service.predict_loan_status(&input));
        return Ok(());
    }

    loop {
        let Some(input) = prompt_applicant()? else {
            break;
        };
        println!("📌 {}", service.predict_loan_status(&input));
    }
    Ok(())
}

/// Reads one applicant from stdin. `None` when the user typed `exit`.
fn prompt_applicant() -> Result<Option<RawInput>> {
    let mut input = RawInput::new();
    for (field, hint) in PROMPTS {
        print!("{field} ({hint}) or 'exit': ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let value = line.trim();
        if value.eq_ignore_ascii_case("exit") {
            return Ok(None);
        }
        if !value.is_empty() {
            input.insert(field, value);
        }
    }
    Ok(Some(input))
}

fn importance() -> Result<()> {
    let service = load_service();
    let ranked = service
        .feature_importances()
        .context("could not calculate feature importance")?;

    println!("📊 Feature Importance:");
    for f in ranked {
        println!("{:>25} | {:.4}", f.feature, f.score);
    }
    Ok(())
}

fn bias_probe(args: &[String]) -> Result<()> {
    let field = args.first().context("bias needs a categorical field name")?;
    let base = match args.get(1) {
        Some(json) => RawInput::from_json(json)?,
        None => RawInput::new(),
    };

    let report = bias::probe(&load_service(), &base, field)?;
    println!("⚖️ {report}");
    println!("approval rate: {:.0}%", report.approval_rate() * 100.0);
    Ok(())
}

fn chat_once(args: &[String]) -> Result<()> {
    let config = AppConfig::from_env();
    let mut mode = ChatMode::Remote;
    let mut model = config.model_name.clone();
    let mut words = Vec::new();

    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--local" => mode = ChatMode::Local,
            "--model" => model = it.next().context("--model needs a name")?.clone(),
            _ => words.push(arg.as_str()),
        }
    }
    if words.is_empty() {
        bail!("chat needs a question\n{USAGE}");
    }
    if model != config.model_name && !AVAILABLE_MODELS.contains(&model.as_str()) {
        tracing::warn!(%model, available = ?AVAILABLE_MODELS, "model is not in the known list");
    }

    println!(
        "⚙️ model: {model} | endpoint: {} | API key: {}",
        config.base_url,
        if config.has_api_key() { "set" } else { "missing" }
    );

    let client = NebiusClient::from_config(&config)?;
    let reply = chat::respond(mode, &words.join(" "), &model, &client);
    println!("### 🤖 {}", reply.title);
    println!("{}", reply.body);
    if let Some(hint) = reply.hint {
        println!("ℹ️ {hint}");
    }
    Ok(())
}
