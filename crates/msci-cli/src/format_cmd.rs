use std::fs;

use msci_api::{format_source, ApiError};

use crate::{load_table, map_cli_script_write, map_cli_source_read, resolve_script_file, FormatArgs};

pub(crate) fn run_format(args: FormatArgs) -> Result<i32, ApiError> {
    let table = load_table(args.syntax.as_deref())?;
    let path = resolve_script_file(&args.script)?;
    let source = fs::read_to_string(&path).map_err(map_cli_source_read)?;
    let formatted = format_source(&source, &table, args.game_version, args.indent);

    if !args.write {
        print!("{}", formatted);
        if !formatted.is_empty() && !formatted.ends_with('\n') {
            println!();
        }
        return Ok(0);
    }

    println!("RESULT:OK");
    if formatted == source {
        println!("UNCHANGED:{}", path.display());
    } else {
        fs::write(&path, &formatted).map_err(map_cli_script_write)?;
        println!("WROTE:{}", path.display());
    }
    Ok(0)
}
