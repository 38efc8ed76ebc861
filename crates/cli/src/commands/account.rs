//! Account commands: `register`, `login`, `logout`, `whoami`.

use emporium_client::{Credentials, Registration};
use emporium_core::{Email, User};

use super::{CliError, Context, read_password};

/// Account details collected from the command line.
pub struct NewAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

pub async fn register(ctx: &Context, details: NewAccount) -> Result<(), CliError> {
    let email = Email::parse(&details.email)?;
    let password = read_password()?;
    let registration = Registration {
        email,
        password,
        first_name: details.first_name,
        last_name: details.last_name,
        phone: details.phone,
        address: details.address,
    };

    let mut users = ctx.user_store();
    let user = users
        .register(&registration)
        .await
        .map_err(|e| CliError::action(users.status(), e))?;

    #[allow(clippy::print_stdout)]
    {
        println!("Welcome, {}! You are signed in.", user.display_name());
    }
    Ok(())
}

pub async fn login(ctx: &Context, email: &str) -> Result<(), CliError> {
    let email = Email::parse(email)?;
    let credentials = Credentials {
        email,
        password: read_password()?,
    };

    let mut users = ctx.user_store();
    let user = users
        .login(&credentials)
        .await
        .map_err(|e| CliError::action(users.status(), e))?;

    #[allow(clippy::print_stdout)]
    {
        println!("Signed in as {}.", user.display_name());
    }
    Ok(())
}

pub async fn logout(ctx: &Context) {
    let mut users = ctx.user_store();
    users.logout().await;

    #[allow(clippy::print_stdout)]
    {
        println!("Signed out.");
    }
}

pub async fn whoami(ctx: &Context) -> Result<(), CliError> {
    let user = ctx.signed_in_user().await?;

    #[allow(clippy::print_stdout)]
    {
        for line in profile_lines(&user) {
            println!("{line}");
        }
    }
    Ok(())
}

fn profile_lines(user: &User) -> Vec<String> {
    let mut lines = vec![
        format!("{} (#{})", user.display_name(), user.id),
        format!("  Email:   {}", user.email),
        format!("  Role:    {}", user.role),
    ];
    if let Some(phone) = &user.phone {
        lines.push(format!("  Phone:   {phone}"));
    }
    if let Some(address) = &user.address {
        lines.push(format!("  Address: {address}"));
    }
    lines
}
