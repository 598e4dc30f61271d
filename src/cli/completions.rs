use crate::cli::args::{Cli, CompletionCommands};
use crate::utils::errors::Result;
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

pub fn handle_completion_command(command: &CompletionCommands) -> Result<()> {
    let shell = command.shell();
    let mut cmd = Cli::command();
    let app_name = "certifyme-rs";

    // For bash, complete server keys from the config file
    if matches!(shell, Shell::Bash) {
        println!("# Enhanced completion for certifyme-rs server keys");
        print!(
            r#"
_certifyme_rs_complete_servers() {{
    local servers
    servers=$(certifyme-rs servers list --raw 2>/dev/null | tail -n +2 | cut -f1)
    COMPREPLY=($(compgen -W "$servers" -- "${{cur}}"))
}}

_certifyme_rs_override() {{
    local cur prev words cword
    _init_completion || return

    case "$prev" in
        "--server"|"-s"|"--on")
            _certifyme_rs_complete_servers
            return 0
            ;;
    esac

    # Fall back to the original completion
    _certifyme-rs "$@"
}}

"#
        );

        generate(shell, &mut cmd, app_name, &mut io::stdout());

        println!();
        println!("# Override the completion function");
        println!("complete -F _certifyme_rs_override certifyme-rs");
    } else {
        generate(shell, &mut cmd, app_name, &mut io::stdout());
    }

    Ok(())
}
