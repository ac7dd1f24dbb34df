// src/parser/tables/emit_c.rs
// C definitions + declarations for the parser runtime.
//
// Header: symbol enums in persisted order, the bucket types, prototypes.
// Source: static pool/bucket initializers, the index function, the two name
//         lookups, parser_init (allocate + fill) and parser_free.
//
// Output depends only on the EncodedTable, so the same grammar and config
// always produce byte-identical files.

use std::fmt::Write;

use super::{
    encode::{EncodedTable, Slot},
    hash::Major,
};
use crate::error::Result;

pub struct Artifacts {
    pub source: String,
    pub header: String,
}

fn c_string(s: &str) -> Result<String, std::fmt::Error> {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for b in s.bytes() {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => write!(out, "\\{b:03o}")?,
        }
    }
    out.push('"');
    Ok(out)
}

fn banner(out: &mut String, generator: &str) -> std::fmt::Result {
    writeln!(out, "/*")?;
    writeln!(out, " * This file was generated by {generator}, DO NOT MODIFY!")?;
    writeln!(out, " */")
}

fn write_header(out: &mut String, t: &EncodedTable, generator: &str) -> std::fmt::Result {
    banner(out, generator)?;
    writeln!(out, "#pragma once\n")?;
    writeln!(out, "#include <stddef.h>")?;
    writeln!(out, "#include <stdint.h>")?;
    writeln!(out, "#include <stdbool.h>\n")?;

    writeln!(out, "// enumerator order is the hash order; do not reorder")?;
    writeln!(out, "typedef enum\n{{")?;
    for name in &t.symbols.nonterminal_names {
        writeln!(out, "    NT_{name},")?;
    }
    writeln!(out, "}} nterm_type_t;\n")?;

    writeln!(out, "typedef enum\n{{")?;
    for name in &t.symbols.terminal_names {
        writeln!(out, "    T_{name},")?;
    }
    writeln!(out, "}} term_type_t;\n")?;

    writeln!(out, "// nonterminal or terminal")?;
    writeln!(out, "typedef struct {{")?;
    writeln!(out, "    bool is_nterm;")?;
    writeln!(out, "    union {{")?;
    writeln!(out, "        nterm_type_t nterm;")?;
    writeln!(out, "        term_type_t term;")?;
    writeln!(out, "    }};")?;
    writeln!(out, "}} nut_type_t;\n")?;

    writeln!(out, "// valid with size 0 = epsilon, !valid = syntax error")?;
    writeln!(out, "typedef struct {{")?;
    writeln!(out, "    size_t size;")?;
    writeln!(out, "    nut_type_t *data;")?;
    writeln!(out, "    bool valid;")?;
    writeln!(out, "}} exp_list_t;\n")?;

    writeln!(out, "// collision-free hash table, index with parser_get_table_index")?;
    writeln!(out, "typedef struct {{")?;
    writeln!(out, "    size_t bucket_count;")?;
    writeln!(out, "    exp_list_t data[];")?;
    writeln!(out, "}} parser_table_t;\n")?;

    writeln!(out, "#define PARSER_TABLE_BUCKETS {}\n", t.modulus)?;

    writeln!(out, "size_t parser_get_table_index(nterm_type_t nterm, term_type_t term);")?;
    writeln!(out, "const char *nterm_to_readable(nterm_type_t nterm);")?;
    writeln!(out, "const char *term_to_readable(term_type_t term);")?;
    writeln!(out, "int parser_init(void);")?;
    writeln!(out, "void parser_free(void);\n")?;
    writeln!(out, "extern parser_table_t *table;")
}

fn write_source(
    out: &mut String,
    t: &EncodedTable,
    generator: &str,
    header_include: &str,
) -> std::fmt::Result {
    let names = &t.symbols;
    banner(out, generator)?;
    writeln!(out, "#include <stdlib.h>")?;
    writeln!(out, "#include <string.h>\n")?;
    writeln!(out, "#include {}\n", c_string(header_include)?)?;
    writeln!(out, "parser_table_t *table;\n")?;

    // All payloads live in one allocation.
    let total = t.pool.len();
    writeln!(out, "#define PARSER_POOL_SLOTS {total}\n")?;
    writeln!(out, "static nut_type_t *pool;\n")?;
    if total > 0 {
        writeln!(out, "static const nut_type_t pool_init[PARSER_POOL_SLOTS] = {{")?;
        for slot in &t.pool {
            match *slot {
                Slot::Nonterminal(i) => writeln!(
                    out,
                    "    {{ .is_nterm = true, .nterm = NT_{} }},",
                    names.nonterminal_names[i as usize]
                )?,
                Slot::Terminal(i) => writeln!(
                    out,
                    "    {{ .is_nterm = false, .term = T_{} }},",
                    names.terminal_names[i as usize]
                )?,
            }
        }
        writeln!(out, "}};\n")?;
    }

    writeln!(out, "static const struct {{")?;
    writeln!(out, "    bool valid;")?;
    writeln!(out, "    size_t offset;")?;
    writeln!(out, "    size_t size;")?;
    writeln!(out, "}} bucket_init[PARSER_TABLE_BUCKETS] = {{")?;
    for (i, b) in t.buckets.iter().enumerate() {
        if b.valid {
            writeln!(out, "    [{i}] = {{ true, {}, {} }},", b.offset, b.len)?;
        }
    }
    writeln!(out, "}};\n")?;

    writeln!(out, "size_t parser_get_table_index(nterm_type_t nterm, term_type_t term)\n{{")?;
    match t.major {
        Major::Nonterminal => writeln!(
            out,
            "    return (((size_t) nterm << {}) + (size_t) term) % PARSER_TABLE_BUCKETS;",
            t.shift
        )?,
        Major::Terminal => writeln!(
            out,
            "    return (((size_t) term << {}) + (size_t) nterm) % PARSER_TABLE_BUCKETS;",
            t.shift
        )?,
    }
    writeln!(out, "}}\n")?;

    writeln!(out, "const char *nterm_to_readable(nterm_type_t nterm)\n{{")?;
    writeln!(out, "    switch(nterm) {{")?;
    for (display, name) in names.nonterminals.iter().zip(&names.nonterminal_names) {
        writeln!(out, "    case NT_{name}:")?;
        writeln!(out, "        return {};", c_string(display)?)?;
    }
    writeln!(out, "    }}")?;
    writeln!(out, "    return \"<unknown-nterm>\";")?;
    writeln!(out, "}}\n")?;

    writeln!(out, "const char *term_to_readable(term_type_t term)\n{{")?;
    writeln!(out, "    switch(term) {{")?;
    for (display, name) in names.terminals.iter().zip(&names.terminal_names) {
        writeln!(out, "    case T_{name}:")?;
        writeln!(out, "        return {};", c_string(display)?)?;
    }
    writeln!(out, "    }}")?;
    writeln!(out, "    return \"<unknown-term>\";")?;
    writeln!(out, "}}\n")?;

    writeln!(out, "int parser_init(void)\n{{")?;
    if total > 0 {
        writeln!(out, "    pool = calloc(PARSER_POOL_SLOTS, sizeof(nut_type_t));")?;
        writeln!(out, "    if(pool == NULL) {{")?;
        writeln!(out, "        return 1;")?;
        writeln!(out, "    }}")?;
        writeln!(out, "    memcpy(pool, pool_init, sizeof(pool_init));\n")?;
    } else {
        writeln!(out, "    pool = NULL;\n")?;
    }
    writeln!(
        out,
        "    table = calloc(1, sizeof(parser_table_t) + PARSER_TABLE_BUCKETS * sizeof(exp_list_t));"
    )?;
    writeln!(out, "    if(table == NULL) {{")?;
    writeln!(out, "        free(pool);")?;
    writeln!(out, "        pool = NULL;")?;
    writeln!(out, "        return 1;")?;
    writeln!(out, "    }}")?;
    writeln!(out, "    table->bucket_count = PARSER_TABLE_BUCKETS;\n")?;
    writeln!(out, "    for(size_t i = 0; i < PARSER_TABLE_BUCKETS; i++) {{")?;
    writeln!(out, "        if(!bucket_init[i].valid) {{")?;
    writeln!(out, "            continue;")?;
    writeln!(out, "        }}")?;
    writeln!(out, "        table->data[i].valid = true;")?;
    writeln!(out, "        table->data[i].size = bucket_init[i].size;")?;
    writeln!(
        out,
        "        table->data[i].data = bucket_init[i].size ? pool + bucket_init[i].offset : NULL;"
    )?;
    writeln!(out, "    }}")?;
    writeln!(out, "    return 0;")?;
    writeln!(out, "}}\n")?;

    writeln!(out, "void parser_free(void)\n{{")?;
    writeln!(out, "    free(table);")?;
    writeln!(out, "    table = NULL;")?;
    writeln!(out, "    free(pool);")?;
    writeln!(out, "    pool = NULL;")?;
    writeln!(out, "}}")
}

impl Artifacts {
    /// `header_include` is the name the source uses to `#include` the header.
    pub fn render(t: &EncodedTable, generator: &str, header_include: &str) -> Result<Self> {
        let mut header = String::new();
        write_header(&mut header, t, generator)?;
        let mut source = String::new();
        write_source(&mut source, t, generator, header_include)?;
        Ok(Self { source, header })
    }
}
