use std::{process::ExitCode, time::Duration};

use clap::Parser;
use client::{
    ContactController,
    models::DEFAULT_ENDPOINT,
    ui::{Banner, BannerKind, ContactForm},
};
use contact::ContactSubmission;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Relay endpoint the form posts to
    #[arg(long, env = "CONTACT_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    subject: String,

    #[arg(long)]
    message: String,
}

/// The form as typed on the command line, rendered to the terminal.
struct TerminalForm {
    fields: ContactSubmission,
    loader: Option<ProgressBar>,
}

impl ContactForm for TerminalForm {
    fn fields(&self) -> ContactSubmission {
        self.fields.clone()
    }

    fn reset(&mut self) {
        self.fields = ContactSubmission::default();
    }

    fn set_submitting(&mut self, submitting: bool) {
        if !submitting {
            if let Some(loader) = self.loader.take() {
                loader.finish_and_clear();
            }
            return;
        }

        let loader = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            loader.set_style(style);
        }
        loader.set_message("Enviando...");
        loader.enable_steady_tick(Duration::from_millis(100));

        self.loader = Some(loader);
    }

    // A terminal line is already in view and stays in scrollback, so there is nothing to dismiss.
    fn show_message(&mut self, banner: Banner) {
        match banner.kind {
            BannerKind::Success => println!("✔ {}", banner.text),
            BannerKind::Error => eprintln!("✘ {}", banner.text),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut form = TerminalForm {
        fields: ContactSubmission::new(args.name, args.email, args.subject, args.message),
        loader: None,
    };

    let controller = ContactController::new(args.endpoint);

    match controller.submit(&mut form).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
