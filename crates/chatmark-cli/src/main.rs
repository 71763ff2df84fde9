use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use chatmark_core::{HelperConfig, LinkifierTable, emit_html, get_topic_links, parse, render};
use chatmark_paste::paste_handler_converter;

#[derive(Clone, Copy)]
enum Mode {
    Render,
    TopicLinks,
    Paste,
}

fn main() {
    let mut input: Option<String> = None;
    let mut mode = Mode::Render;
    let mut raw = false;
    let mut realm_url = String::from("http://localhost");
    let mut linkifier_specs: Vec<String> = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "--topic-links" => mode = Mode::TopicLinks,
            "--paste" => mode = Mode::Paste,
            "--raw" => raw = true,
            "--realm-url" => {
                realm_url = match args.next() {
                    Some(url) => url,
                    None => {
                        eprintln!("--realm-url expects a URL");
                        print_usage();
                        process::exit(2);
                    }
                };
            }
            "--linkifier" => {
                let spec = match args.next() {
                    Some(spec) => spec,
                    None => {
                        eprintln!("--linkifier expects PATTERN=TEMPLATE");
                        print_usage();
                        process::exit(2);
                    }
                };
                linkifier_specs.push(spec);
            }
            _ => {
                if input.is_none() {
                    input = Some(arg);
                } else {
                    eprintln!("unexpected argument: {}", arg);
                    print_usage();
                    process::exit(2);
                }
            }
        }
    }

    let source = match input {
        Some(path) => fs::read_to_string(&path).unwrap_or_else(|err| {
            eprintln!("failed to read {}: {}", path, err);
            process::exit(1);
        }),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .unwrap_or_else(|err| {
                    eprintln!("failed to read stdin: {}", err);
                    process::exit(1);
                });
            buffer
        }
    };

    let mut linkifiers = LinkifierTable::new();
    for spec in &linkifier_specs {
        let Some((pattern, template)) = spec.split_once('=') else {
            eprintln!("bad linkifier spec (expected PATTERN=TEMPLATE): {}", spec);
            process::exit(2);
        };
        if let Err(err) = linkifiers.add(pattern, template) {
            eprintln!("rejected linkifier: {}", err);
            process::exit(2);
        }
    }

    let helper = HelperConfig::new(realm_url);

    match mode {
        Mode::Render => {
            let html = if raw {
                emit_html(&parse(&source, &helper, &linkifiers))
            } else {
                render(&source, &helper, &linkifiers)
            };
            println!("{}", html);
        }
        Mode::TopicLinks => {
            for link in get_topic_links(source.trim_end_matches('\n'), &linkifiers) {
                println!("{}\t{}", link.text, link.url);
            }
        }
        Mode::Paste => {
            println!("{}", paste_handler_converter(&source, None));
        }
    }
}

fn print_usage() {
    eprintln!(
        "Usage: chatmark-cli [--topic-links | --paste] [--raw] [--realm-url URL] \
[--linkifier PATTERN=TEMPLATE]... [input]"
    );
}
