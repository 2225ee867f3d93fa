use std::io::Write;
use std::sync::Arc;

use serde_json::json;
use spiderverse::prelude::*;
use spiderverse::session::SessionError;
use spiderverse::telemetry;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

const HELP: &str = "\
commands:
  login <email>         sign in (a local identity is minted)
  logout                sign out (asks first)
  list                  show the collection
  reload                fetch the collection again
  new                   open the form on a new character
  edit <id>             open the form on an existing character
  set <field> <text>    set name | alias | description | powers
  show                  show the open form
  save                  submit the form
  cancel                discard the form
  delete <id>           delete a character (asks first)
  help                  show this text
  quit                  exit";

type Input = Lines<BufReader<Stdin>>;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    telemetry::init();

    let offline = std::env::args().skip(1).any(|arg| arg == "--offline");
    let gateway = Arc::new(LocalAuthGateway::resolved(None));

    if offline {
        let store = Arc::new(MemoryRemoteStore::new());
        store.insert(json!({
            "name": "Peter Parker",
            "alias": "Spider-Man",
            "description": "Bitten by a radioactive spider on a school trip",
            "powers": "Wall-crawling, spider-sense"
        }));
        tracing::info!("running against the in-memory API");
        run(Client::new(Arc::clone(&gateway), store), &gateway).await
    } else {
        let client = Client::connect(Arc::clone(&gateway), ClientConfig::from_env()?)?;
        run(client, &gateway).await
    }
}

async fn run<R: RemoteStore>(
    mut client: Client<LocalAuthGateway, R>,
    gateway: &LocalAuthGateway,
) -> Result<(), ClientError> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    report(client.resolved().await.map(drop));
    println!("{HELP}");

    loop {
        prompt(&client);
        let Some(line) = read_line(&mut input).await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "quit" | "exit" => break,
            "help" => println!("{HELP}"),
            _ => {
                let result = execute(&mut client, gateway, &mut input, command, rest.trim()).await;
                report(result);
            }
        }
    }

    client.teardown();
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn execute<R: RemoteStore>(
    client: &mut Client<LocalAuthGateway, R>,
    gateway: &LocalAuthGateway,
    input: &mut Input,
    command: &str,
    args: &str,
) -> Result<(), ClientError> {
    match command {
        "login" => {
            if args.is_empty() {
                println!("usage: login <email>");
                return Ok(());
            }
            gateway.sign_in(args);
            client.sync().await?;
            print_collection(client);
        }
        "logout" => {
            if client.identity().is_none() {
                return Err(SessionError::NotSignedIn.into());
            }
            if confirm(input, "sign out?").await {
                client.sign_out().await?;
            }
        }
        "list" => print_collection(client),
        "reload" => {
            mounted(client)?.load().await?;
            print_collection(client);
        }
        "new" => {
            mounted(client)?;
            client.form_mut().open_new();
        }
        "edit" => client.edit(&CharacterId::new(args))?,
        "set" => {
            let (name, value) = args.split_once(' ').unwrap_or((args, ""));
            let Some(field) = parse_field(name) else {
                println!("unknown field {name:?}; use name, alias, description or powers");
                return Ok(());
            };
            client.form_mut().set_field(field, value.trim())?;
        }
        "show" => print_form(client.form()),
        "save" => {
            if let Reconcile::Stale(e) = client.submit_form().await? {
                println!("saved, but the list could not be refreshed ({e}); try `reload`");
            }
            print_collection(client);
        }
        "cancel" => {
            client.form_mut().cancel();
        }
        "delete" => {
            let collection = mounted(client)?;
            let confirmation = collection.confirm_delete(&CharacterId::new(args))?;
            if confirm(input, &format!("delete {}?", confirmation.name())).await {
                if let Reconcile::Stale(e) = collection.delete(confirmation).await? {
                    println!("deleted, but the list could not be refreshed ({e})");
                }
                print_collection(client);
            }
        }
        other => println!("unknown command {other:?}; type `help`"),
    }
    Ok(())
}

fn mounted<R: RemoteStore>(
    client: &mut Client<LocalAuthGateway, R>,
) -> Result<&mut CharacterCollectionController<R>, ClientError> {
    client
        .collection_mut()
        .ok_or_else(|| SessionError::NotSignedIn.into())
}

fn parse_field(name: &str) -> Option<Field> {
    match name.to_ascii_lowercase().as_str() {
        "name" => Some(Field::Name),
        "alias" => Some(Field::Alias),
        "description" => Some(Field::Description),
        "powers" => Some(Field::Powers),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Prints a failed command in user terms. The client never picks the
/// wording; this is the presentation's job.
fn report(result: Result<(), ClientError>) {
    let Err(err) = result else {
        return;
    };

    let text = match &err {
        ClientError::Collection(CollectionError::ServerRejected { message: Some(m) }) => {
            format!("the server refused: {m}")
        }
        ClientError::Session(SessionError::NotSignedIn) => "sign in first".to_string(),
        _ => match err.kind() {
            Some(ErrorKind::Validation) => "a name is required".to_string(),
            Some(ErrorKind::Network) => {
                "couldn't reach the server; check your connection and try again".to_string()
            }
            Some(ErrorKind::ServerRejected) => "the server refused the change".to_string(),
            Some(ErrorKind::InvalidState) | Some(ErrorKind::Detached) | None => err.to_string(),
        },
    };
    println!("error: {text}");
}

fn prompt<R: RemoteStore>(client: &Client<LocalAuthGateway, R>) {
    let who = match client.screen() {
        None => "...".to_string(),
        Some(Screen::Login | Screen::Register) => "signed out".to_string(),
        Some(Screen::Home) => client
            .identity()
            .and_then(|identity| identity.email)
            .unwrap_or_else(|| "home".to_string()),
    };
    let form = match client.form().state() {
        EditState::Closed => String::new(),
        EditState::Creating => " [new]".to_string(),
        EditState::Editing(id) => format!(" [edit {id}]"),
    };
    print!("{who}{form}> ");
    flush();
}

fn print_collection<R: RemoteStore>(client: &Client<LocalAuthGateway, R>) {
    let Some(collection) = client.collection() else {
        println!("(signed out)");
        return;
    };
    if !collection.is_loaded() {
        println!("(loading)");
        return;
    }
    if collection.is_empty() {
        println!("(no characters yet; try `new`)");
        return;
    }
    for character in collection.characters() {
        if character.alias.is_empty() {
            println!("  {:>4}  {}", character.id, character.name);
        } else {
            println!("  {:>4}  {} ({})", character.id, character.name, character.alias);
        }
    }
}

fn print_form(form: &EditSessionController) {
    let Some(draft) = form.draft() else {
        println!("(no form open)");
        return;
    };
    for (label, field) in [
        ("name", Field::Name),
        ("alias", Field::Alias),
        ("description", Field::Description),
        ("powers", Field::Powers),
    ] {
        println!("  {label:>11}: {}", draft.get(field));
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

async fn read_line(input: &mut Input) -> Option<String> {
    match input.next_line().await {
        Ok(line) => line,
        Err(e) => {
            tracing::error!(error = %e, "failed to read stdin");
            None
        }
    }
}

/// Asks a y/N question.
async fn confirm(input: &mut Input, question: &str) -> bool {
    print!("{question} [y/N] ");
    flush();
    let answer = read_line(input).await.unwrap_or_default();
    is_yes(&answer)
}

/// Anything but `y` is a no, including end of input.
fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

fn flush() {
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes_accepts_only_y() {
        assert!(is_yes("y"));
        assert!(is_yes(" Y\n"));

        for answer in ["", "n", "yes", "no", "maybe"] {
            assert!(!is_yes(answer), "{answer:?} should be a no");
        }
    }

    #[test]
    fn test_parse_field_is_case_insensitive() {
        assert_eq!(parse_field("Powers"), Some(Field::Powers));
        assert_eq!(parse_field("nickname"), None);
    }
}
