//! Command line surface
//!
//! Each invocation opens the portal, performs one command and exits; the
//! wizard position and drafts carry over between invocations through the
//! local store. Protected commands pass through an [`AuthGate`] with
//! redirect and warn set; navigation requests are printed as the next
//! command to run.

use crate::auth_gate::{GateOptions, Navigator, Route};
use crate::error::{PortalError, PortalResult};
use crate::models::{Contributor, ProfileUpdate, Registration, SubmissionDetails};
use crate::wizard::{SubmissionWizard, WizardStep};
use crate::validation::{self, ValidationErrors};
use crate::Portal;
use clap::{Args, Parser, Subcommand};
use gjp_common::time;
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "gjp-portal")]
#[command(about = "Global Journal manuscript submission portal")]
#[command(version)]
pub struct Cli {
    /// Folder holding local drafts and the session
    #[arg(long, global = true)]
    pub root_folder: Option<PathBuf>,

    /// Backend base URL (directory holding the PHP endpoints)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Config file (default: ~/.config/gjp/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session locally
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the stored session
    Whoami,
    /// Create an account
    Register(RegisterArgs),
    #[command(subcommand)]
    Profile(ProfileCommand),
    #[command(subcommand)]
    PasswordReset(PasswordResetCommand),
    /// The submission wizard
    #[command(subcommand)]
    Submission(SubmissionCommand),
    /// Submissions already on the server
    #[command(subcommand)]
    Submissions(SubmissionsCommand),
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub given_name: String,
    #[arg(long)]
    pub family_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub password: String,
    #[arg(long)]
    pub confirm_password: String,
    #[arg(long, default_value = "")]
    pub affiliation: String,
    #[arg(long, default_value = "")]
    pub country: String,
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long)]
    pub orcid: Option<String>,
    #[arg(long)]
    pub interests: Option<String>,
    /// Agree to the privacy statement
    #[arg(long)]
    pub agree_to_privacy: bool,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    Show,
    Update {
        #[arg(long)]
        given_name: String,
        #[arg(long, default_value = "")]
        family_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        current_password: Option<String>,
        #[arg(long)]
        new_password: Option<String>,
        #[arg(long)]
        confirm_password: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PasswordResetCommand {
    /// Ask for a reset link by email
    Request {
        #[arg(long)]
        email: String,
    },
    /// Set a new password with the emailed token
    Confirm {
        #[arg(long)]
        token: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SubmissionCommand {
    /// Current step and draft summary
    Status,
    /// Go back one step
    Back,
    /// Open a step (forward only if earlier steps are complete)
    Goto { step: WizardStep },
    /// Register a new title with the backend
    Title { title: String },
    /// Edit submission details, then continue
    Details {
        #[arg(long)]
        title: Option<String>,
        #[arg(long = "abstract")]
        abstract_text: Option<String>,
        /// Comma-separated
        #[arg(long)]
        keywords: Option<String>,
        #[arg(long)]
        save_later: bool,
    },
    /// Upload DOC/DOCX files, then continue
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long)]
        save_later: bool,
    },
    /// Remove an uploaded file (1-based position)
    RemoveFile { index: usize },
    /// Continue from the files step
    Files {
        #[arg(long)]
        save_later: bool,
    },
    #[command(subcommand)]
    Contributor(ContributorCommand),
    /// Set comments for the editor, then continue
    Notes {
        text: String,
        #[arg(long)]
        save_later: bool,
    },
    /// Open review and show readiness
    Review,
    /// Submit from review
    Submit,
}

#[derive(Subcommand, Debug)]
pub enum ContributorCommand {
    List,
    Add(ContributorArgs),
    /// Make the contributor at this 1-based position primary contact
    Primary { index: usize },
    Remove { index: usize },
    /// Add yourself from your profile when the list is empty
    Prefill,
    Continue {
        #[arg(long)]
        save_later: bool,
    },
}

#[derive(Args, Debug)]
pub struct ContributorArgs {
    #[arg(long)]
    pub given_name: String,
    #[arg(long, default_value = "")]
    pub family_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, default_value = "")]
    pub country: String,
    #[arg(long, default_value = "")]
    pub affiliation: String,
    #[arg(long, default_value = "")]
    pub orcid: String,
    #[arg(long, default_value = "")]
    pub homepage: String,
    #[arg(long, default_value = "")]
    pub bio: String,
    #[arg(long)]
    pub translator: bool,
    /// Contributor rather than author
    #[arg(long)]
    pub not_author: bool,
    #[arg(long)]
    pub exclude_from_publications: bool,
    #[arg(long)]
    pub primary: bool,
}

#[derive(Subcommand, Debug)]
pub enum SubmissionsCommand {
    List,
    Delete { id: String },
    /// Point the wizard at an existing submission id
    Resume { id: String },
}

/// Prints navigation requests as the next command to run
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNavigator;

impl TerminalNavigator {
    pub fn command_for(route: Route) -> String {
        match route {
            Route::Login => "gjp-portal login --email <EMAIL> --password <PASSWORD>".to_string(),
            Route::Profile => "gjp-portal profile show".to_string(),
            Route::Submissions => "gjp-portal submissions list".to_string(),
            Route::Wizard(step) => format!("gjp-portal submission goto {}", step),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        println!("Next: {}", Self::command_for(route));
    }

    fn notify_blocking(&self, message: &str) {
        eprintln!("{}", message);
    }
}

fn require_login(portal: &Portal, route: Route) -> PortalResult<()> {
    let gate = portal.gate(
        TerminalNavigator,
        GateOptions {
            redirect: true,
            warn: true,
        },
        route,
    );
    if gate.is_authenticated() {
        Ok(())
    } else {
        Err(PortalError::NotAuthenticated)
    }
}

/// Run one command against `portal`
pub async fn run(portal: &Portal, command: Command) -> PortalResult<()> {
    match command {
        Command::Login { email, password } => {
            let token = portal.accounts().login(&email, &password).await?;
            println!("Logged in as {} <{}>", token.name, token.email);
            TerminalNavigator.navigate(Route::Profile);
        }
        Command::Logout => {
            portal.accounts().logout()?;
            println!("Logged out");
        }
        Command::Whoami => match portal.session().get_token() {
            Some(token) => {
                let state = if token.is_expired_at(time::now()) {
                    "expired"
                } else {
                    "valid"
                };
                println!(
                    "{} <{}> (id {}), session {} until {}",
                    token.name, token.email, token.id, state, token.expires_at
                );
            }
            None => println!("Not logged in"),
        },
        Command::Register(args) => {
            let form = Registration {
                given_name: args.given_name,
                family_name: args.family_name,
                affiliation: args.affiliation,
                country: args.country,
                phone_number: args.phone,
                email: args.email,
                username: args.username,
                password: args.password,
                confirm_password: args.confirm_password,
                orcid_id: args.orcid,
                areas_of_interest: args.interests,
                agree_to_privacy: args.agree_to_privacy,
            };
            let ack = portal.accounts().register(&form).await?;
            println!(
                "{}",
                ack.message
                    .unwrap_or_else(|| "Registration successful. Please log in.".to_string())
            );
            TerminalNavigator.navigate(Route::Login);
        }
        Command::Profile(cmd) => {
            require_login(portal, Route::Profile)?;
            run_profile(portal, cmd).await?;
        }
        Command::PasswordReset(PasswordResetCommand::Request { email }) => {
            portal.accounts().request_password_reset(&email).await?;
            println!("A password reset link has been sent to your email if it exists in our system.");
        }
        Command::PasswordReset(PasswordResetCommand::Confirm {
            token,
            password,
            confirm_password,
        }) => {
            portal
                .accounts()
                .confirm_password_reset(&token, &password, &confirm_password)
                .await?;
            println!("Password reset successful.");
            TerminalNavigator.navigate(Route::Login);
        }
        Command::Submission(cmd) => {
            let mut wizard = portal.wizard();
            require_login(portal, Route::Wizard(wizard.step()))?;
            run_submission(portal, &mut wizard, cmd).await?;
        }
        Command::Submissions(cmd) => {
            require_login(portal, Route::Submissions)?;
            run_submissions(portal, cmd).await?;
        }
    }
    Ok(())
}

async fn run_profile(portal: &Portal, cmd: ProfileCommand) -> PortalResult<()> {
    match cmd {
        ProfileCommand::Show => {
            let profile = portal.accounts().profile().await?;
            println!("Name:        {}", profile.name);
            println!("Email:       {}", profile.email);
            let optional = [
                ("Username", &profile.username),
                ("Affiliation", &profile.affiliation),
                ("Country", &profile.country),
                ("ORCID iD", &profile.orcid_id),
                ("Website", &profile.website),
                ("Phone", &profile.phonenumber),
            ];
            for (label, value) in optional {
                if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                    println!("{:<12} {}", format!("{}:", label), value);
                }
            }
        }
        ProfileCommand::Update {
            given_name,
            family_name,
            email,
            current_password,
            new_password,
            confirm_password,
        } => {
            let form = ProfileUpdate {
                given_name,
                family_name,
                email,
                current_password,
                new_password,
                confirm_password,
            };
            let ack = portal.accounts().update_profile(&form).await?;
            println!(
                "{}",
                ack.message
                    .unwrap_or_else(|| "Profile updated successfully".to_string())
            );
        }
    }
    Ok(())
}

async fn run_submissions(portal: &Portal, cmd: SubmissionsCommand) -> PortalResult<()> {
    let gateway = portal.submissions();
    match cmd {
        SubmissionsCommand::List => {
            let list = gateway.list().await?;
            if list.is_empty() {
                println!("No submissions yet");
            }
            for s in list {
                println!(
                    "{:>8}  {:<12}  {}  {}",
                    s.id,
                    s.status,
                    s.last_activity.as_deref().unwrap_or("-"),
                    s.title
                );
            }
        }
        SubmissionsCommand::Delete { id } => {
            gateway.delete(&id).await?;
            println!("Deleted submission {}", id);
        }
        SubmissionsCommand::Resume { id } => {
            portal.drafts().set_submission_id(&id)?;
            println!("Resuming submission {}", id);
            TerminalNavigator.navigate(Route::Wizard(portal.wizard().step()));
        }
    }
    Ok(())
}

async fn run_submission(
    portal: &Portal,
    wizard: &mut SubmissionWizard,
    cmd: SubmissionCommand,
) -> PortalResult<()> {
    let gateway = portal.submissions();

    match cmd {
        SubmissionCommand::Status => print_status(wizard),
        SubmissionCommand::Back => {
            let step = wizard.back()?;
            println!("Now at: {}", step.label());
        }
        SubmissionCommand::Goto { step } => {
            wizard.enter(step)?;
            println!("Now at: {}", step.label());
            if step == WizardStep::Review {
                print_review(wizard);
            }
        }
        SubmissionCommand::Title { title } => {
            let ack = gateway.create_title(&title).await?;
            println!(
                "{}",
                ack.message.unwrap_or_else(|| format!("Created \"{}\"", title))
            );
        }
        SubmissionCommand::Details {
            title,
            abstract_text,
            keywords,
            save_later,
        } => {
            wizard.enter(WizardStep::Details)?;
            let mut details = wizard.details().clone();
            if let Some(title) = title {
                details.title = title;
            }
            if let Some(abstract_text) = abstract_text {
                details.abstract_text = abstract_text;
            }
            if let Some(keywords) = keywords {
                details = details.with_keywords(&keywords);
            }
            wizard.set_details(details);
            finish_step(wizard, save_later)?;
        }
        SubmissionCommand::Upload { paths, save_later } => {
            wizard.enter(WizardStep::Files)?;
            for path in paths {
                let file = wizard.upload(&gateway, &path).await?;
                println!(
                    "Uploaded {} ({}, {})",
                    file.name,
                    file.display_size(),
                    file.category.label()
                );
            }
            finish_step(wizard, save_later)?;
        }
        SubmissionCommand::RemoveFile { index } => {
            wizard.enter(WizardStep::Files)?;
            let removed = wizard.remove_file(position(index, "index")?)?;
            wizard.save_for_later()?;
            println!("Removed {}", removed.name);
        }
        SubmissionCommand::Files { save_later } => {
            wizard.enter(WizardStep::Files)?;
            finish_step(wizard, save_later)?;
        }
        SubmissionCommand::Contributor(cmd) => {
            wizard.enter(WizardStep::Contributors)?;
            run_contributor(portal, wizard, cmd).await?;
        }
        SubmissionCommand::Notes { text, save_later } => {
            wizard.enter(WizardStep::EditorNotes)?;
            wizard.set_editor_notes(text);
            finish_step(wizard, save_later)?;
            if wizard.step() == WizardStep::Review {
                print_review(wizard);
            }
        }
        SubmissionCommand::Review => {
            wizard.review()?;
            print_review(wizard);
        }
        SubmissionCommand::Submit => {
            if wizard.step() != WizardStep::Review {
                wizard.review()?;
            }
            let submitted = wizard.submit(&gateway).await?;
            println!("Your submission has been successfully submitted!");
            TerminalNavigator.navigate(submitted.next);
        }
    }
    Ok(())
}

async fn run_contributor(
    portal: &Portal,
    wizard: &mut SubmissionWizard,
    cmd: ContributorCommand,
) -> PortalResult<()> {
    match cmd {
        ContributorCommand::List => {}
        ContributorCommand::Add(args) => {
            if !args.orcid.trim().is_empty() && !validation::is_valid_orcid(&args.orcid) {
                warn!("ORCID iD {:?} is not well formed; keeping it as entered", args.orcid);
            }
            let mut contributor = Contributor::new(args.given_name, args.email);
            contributor.family_name = args.family_name;
            contributor.preferred_name = contributor.full_name();
            contributor.country = args.country;
            contributor.affiliation = args.affiliation;
            contributor.orcid_id = args.orcid;
            contributor.homepage_url = args.homepage;
            contributor.bio_statement = args.bio;
            contributor.is_translator = args.translator;
            contributor.is_author = !args.not_author;
            contributor.include_in_publications = !args.exclude_from_publications;

            let index = wizard.contributors_mut().add(contributor);
            if args.primary {
                wizard.contributors_mut().set_primary_contact(index)?;
            }
            wizard.save_for_later()?;
        }
        ContributorCommand::Primary { index } => {
            wizard
                .contributors_mut()
                .set_primary_contact(position(index, "index")?)?;
            wizard.save_for_later()?;
        }
        ContributorCommand::Remove { index } => {
            let removed = wizard.contributors_mut().remove(position(index, "index")?)?;
            wizard.save_for_later()?;
            println!("Removed {}", removed.full_name());
        }
        ContributorCommand::Prefill => {
            let profile = portal.accounts().profile().await?;
            if wizard.prefill_contributor_from_profile(&profile) {
                wizard.save_for_later()?;
            } else {
                println!("Contributor list is not empty; nothing prefilled");
            }
        }
        ContributorCommand::Continue { save_later } => {
            finish_step(wizard, save_later)?;
            if let Err(e) = wizard.sync_contributors(&portal.submissions()).await {
                warn!(error = %e, "Contributor sync with backend failed");
                eprintln!(
                    "Contributors saved locally but not on the server: {}",
                    e.user_message()
                );
            }
            return Ok(());
        }
    }

    for (i, c) in wizard.contributors().iter().enumerate() {
        println!("{:>3}. {} <{}> [{}]", i + 1, c.full_name(), c.email, c.role_label());
    }
    Ok(())
}

/// Continue, or save without validating
/// Positions on the command line are 1-based, as printed by the listings
fn position(index: usize, field: &str) -> PortalResult<usize> {
    match index.checked_sub(1) {
        Some(i) => Ok(i),
        None => {
            let mut errors = ValidationErrors::new();
            errors.push(field, "Positions start at 1");
            Err(errors.into())
        }
    }
}

fn finish_step(wizard: &mut SubmissionWizard, save_later: bool) -> PortalResult<()> {
    if save_later {
        wizard.save_for_later()?;
        println!("Your submission has been saved for later.");
    } else {
        let step = wizard.continue_step()?;
        println!("Now at: {}", step.label());
    }
    Ok(())
}

fn print_status(wizard: &SubmissionWizard) {
    println!("Step:          {}", wizard.step().label());
    println!(
        "Submission id: {}",
        wizard.submission_id().unwrap_or_else(|| "(not yet assigned)".to_string())
    );
    let details = wizard.details();
    println!("Title:         {}", details.title);
    println!("Keywords:      {}", details.keywords.join(", "));
    println!("Files:         {}", wizard.files().len());
    println!("Contributors:  {}", wizard.contributors().len());
    println!(
        "Editor notes:  {}",
        if wizard.editor_notes().trim().is_empty() {
            "(none)"
        } else {
            "provided"
        }
    );
}

fn print_review(wizard: &SubmissionWizard) {
    let Some(report) = wizard.readiness() else {
        return;
    };
    let mark = |ok: bool| if ok { "ok" } else { "incomplete" };
    println!("Submission details:      {}", mark(report.details));
    println!("Files:                   {}", mark(report.files));
    println!("Contributors:            {}", mark(report.contributors));
    println!("Comments for the editor: {}", mark(report.editor_notes));
    for e in report.errors.iter() {
        println!("  - {}", e.message);
    }
    if report.is_ready() {
        println!("Ready to submit: gjp-portal submission submit");
    }
}
