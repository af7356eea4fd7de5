//! Renders the seed catalog as SQL in the two dialects the installers use.

use crate::core::sql_text::{quote_literal, BANNER};
use crate::domain::catalog::SeedCatalog;
use std::fmt::Write;

/// First line of every generated block; used to detect an already seeded file.
pub const SEED_BLOCK_TITLE: &str = "-- DADOS INICIAIS ESSENCIAIS";
pub const SIMPLE_BLOCK_TITLE: &str = "-- DADOS INICIAIS: USUÁRIO ADMIN (VERSÃO SIMPLES)";

fn category_label(category: &str) -> &str {
    match category {
        "VENDAS" => "Vendas",
        "STOCK" => "Stock",
        "CADASTROS" => "Cadastros",
        "FINANCEIRO" => "Financeiro",
        "RELATORIOS" => "Relatórios",
        "ADMIN" => "Administração",
        other => other,
    }
}

fn role_id(role: &str) -> String {
    format!(
        "(SELECT id FROM perfis_usuario WHERE nome = {})",
        quote_literal(role)
    )
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", BANNER);
    let _ = writeln!(out, "-- {}", title);
    let _ = writeln!(out, "{}", BANNER);
}

fn values_list(out: &mut String, rows: &[String]) {
    for (i, row) in rows.iter().enumerate() {
        let sep = if i + 1 < rows.len() { "," } else { "" };
        let _ = writeln!(out, "    {}{}", row, sep);
    }
}

/// `INSERT ... ON CONFLICT` flavour, for databases created from the sanitized dump.
pub fn render_upsert_block(catalog: &SeedCatalog) -> String {
    let mut out = String::from("\n\n");
    section(&mut out, "DADOS INICIAIS ESSENCIAIS");

    out.push_str("\n-- Perfis de usuário\n");
    out.push_str("INSERT INTO perfis_usuario (nome, descricao) VALUES\n");
    let roles: Vec<String> = catalog
        .roles
        .iter()
        .map(|r| format!("({}, {})", quote_literal(r.name), quote_literal(r.description)))
        .collect();
    values_list(&mut out, &roles);
    out.push_str("ON CONFLICT (nome) DO NOTHING;\n");

    out.push_str("\n-- Permissões do sistema\n");
    out.push_str("INSERT INTO permissoes (codigo, nome, categoria, descricao) VALUES\n");
    let categories = catalog.permission_categories();
    let total = catalog.permissions.len();
    let mut written = 0;
    for (index, category) in categories.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "    -- {}", category_label(category));
        for p in catalog.permissions.iter().filter(|p| p.category == *category) {
            written += 1;
            let sep = if written < total { "," } else { "" };
            let _ = writeln!(
                out,
                "    ({}, {}, {}, {}){}",
                quote_literal(p.code),
                quote_literal(p.name),
                quote_literal(p.category),
                quote_literal(p.description),
                sep
            );
        }
    }
    out.push_str("ON CONFLICT (codigo) DO NOTHING;\n");

    for (i, role) in catalog.full_access_roles.iter().enumerate() {
        if i == 0 {
            out.push_str("\n-- Dar todas as permissões ao Super Administrador e Administrador\n");
        } else {
            out.push('\n');
        }
        out.push_str("INSERT INTO perfil_permissoes (perfil_id, permissao_id)\nSELECT\n");
        let _ = writeln!(out, "    {},", role_id(role));
        out.push_str("    id\nFROM permissoes\nWHERE ativo = true\n");
        out.push_str("ON CONFLICT (perfil_id, permissao_id) DO NOTHING;\n");
    }

    let admin = &catalog.admin;
    out.push_str("\n-- USUÁRIO SUPER ADMINISTRADOR PADRÃO\n");
    let _ = writeln!(out, "-- Nome: {}", admin.name);
    let _ = writeln!(out, "-- Código: {}", admin.code);
    out.push_str("INSERT INTO usuarios (nome, codigo, perfil_id) VALUES\n");
    let _ = writeln!(
        out,
        "    ({}, {}, {})",
        quote_literal(admin.name),
        quote_literal(admin.code),
        role_id(admin.role)
    );
    let _ = writeln!(
        out,
        "ON CONFLICT (codigo) DO UPDATE SET nome = {}, ativo = true;",
        quote_literal(admin.name)
    );

    out.push_str("\n-- Formas de pagamento padrão\n");
    out.push_str("INSERT INTO formas_pagamento (nome, tipo) VALUES\n");
    let methods: Vec<String> = catalog
        .payment_methods
        .iter()
        .map(|m| format!("({}, {})", quote_literal(m.name), quote_literal(m.kind)))
        .collect();
    values_list(&mut out, &methods);
    out.push_str("ON CONFLICT (nome) DO NOTHING;\n");

    for (comment, table, entries) in [
        ("Famílias de produtos padrão", "familias", &catalog.families),
        ("Setores padrão", "setores", &catalog.sectors),
    ] {
        let _ = writeln!(out, "\n-- {}", comment);
        let _ = writeln!(out, "INSERT INTO {} (nome, descricao) VALUES", table);
        let rows: Vec<String> = entries
            .iter()
            .map(|e| format!("({}, {})", quote_literal(e.name), quote_literal(e.description)))
            .collect();
        values_list(&mut out, &rows);
        out.push_str("ON CONFLICT (nome) DO NOTHING;\n");
    }

    out.push('\n');
    section(&mut out, "FIM DOS DADOS INICIAIS");
    out.push_str("\nSELECT 'BASE DE DADOS CRIADA COM SUCESSO!' as status;\n");
    out.push_str(
        "SELECT COUNT(*) || ' tabelas criadas' as info FROM information_schema.tables \
         WHERE table_schema = 'public' AND table_type = 'BASE TABLE';\n\n",
    );
    out
}

fn guarded_insert(out: &mut String, table: &str, key: (&str, &str), columns: &str, values: &[&str]) {
    let quoted: Vec<String> = values.iter().map(|v| quote_literal(v)).collect();
    let _ = writeln!(
        out,
        "    IF NOT EXISTS (SELECT 1 FROM {} WHERE {} = {}) THEN",
        table,
        key.0,
        quote_literal(key.1)
    );
    let _ = writeln!(out, "        INSERT INTO {} ({})", table, columns);
    let _ = writeln!(out, "        VALUES ({});", quoted.join(", "));
    out.push_str("    END IF;\n");
}

/// `DO $$ ... IF NOT EXISTS` flavour, safe to replay on a populated database.
pub fn render_guarded_block(catalog: &SeedCatalog) -> String {
    let mut out = String::from("\n\n");
    section(&mut out, "DADOS INICIAIS ESSENCIAIS");
    out.push_str("-- Adicionados automaticamente baseados na estrutura real\n\n");

    section(&mut out, "1. PERFIS DE USUÁRIO");
    out.push_str("-- Tabela: perfis_usuario (id, nome, descricao, ativo, created_at, updated_at)\n\n");
    out.push_str("DO $$\nBEGIN\n");
    for (i, role) in catalog.roles.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "    -- {}", role.name);
        guarded_insert(
            &mut out,
            "perfis_usuario",
            ("nome", role.name),
            "nome, descricao",
            &[role.name, role.description],
        );
    }
    out.push_str("END $$;\n\n");

    section(&mut out, "2. PERMISSÕES DO SISTEMA");
    out.push_str(
        "-- Tabela: permissoes (id, codigo, nome, descricao, categoria, ativo, created_at)\n\n",
    );
    out.push_str("DO $$\nBEGIN\n");
    for (index, category) in catalog.permission_categories().iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "    -- {}", category_label(category));
        for (i, p) in catalog
            .permissions
            .iter()
            .filter(|p| p.category == *category)
            .enumerate()
        {
            if i > 0 {
                out.push('\n');
            }
            guarded_insert(
                &mut out,
                "permissoes",
                ("codigo", p.code),
                "codigo, nome, categoria, descricao",
                &[p.code, p.name, p.category, p.description],
            );
        }
    }
    out.push_str("END $$;\n\n");

    section(&mut out, "3. VINCULAR PERMISSÕES AOS PERFIS");
    for role in &catalog.full_access_roles {
        let _ = writeln!(out, "\n-- Dar todas as permissões ao {}", role);
        out.push_str("INSERT INTO perfil_permissoes (perfil_id, permissao_id)\nSELECT\n");
        let _ = writeln!(out, "    {},", role_id(role));
        out.push_str("    p.id\nFROM permissoes p\nWHERE p.ativo = true\n  AND NOT EXISTS (\n");
        out.push_str("    SELECT 1 FROM perfil_permissoes pp\n");
        let _ = writeln!(out, "    WHERE pp.perfil_id = {}", role_id(role));
        out.push_str("      AND pp.permissao_id = p.id\n  );\n");
    }
    out.push('\n');

    let admin = &catalog.admin;
    section(&mut out, "4. USUÁRIO ADMINISTRADOR PADRÃO");
    out.push_str(
        "-- Tabela: usuarios (id, nome, perfil_id, codigo, ativo, created_at, updated_at, terminal_id_atual)\n",
    );
    let _ = writeln!(out, "-- Nome: {}", admin.name);
    let _ = writeln!(out, "-- Código: {}\n", admin.code);
    out.push_str("DO $$\nBEGIN\n");
    let _ = writeln!(
        out,
        "    IF NOT EXISTS (SELECT 1 FROM usuarios WHERE codigo = {}) THEN",
        quote_literal(admin.code)
    );
    out.push_str("        INSERT INTO usuarios (nome, codigo, perfil_id)\n");
    let _ = writeln!(
        out,
        "        VALUES ({}, {}, {});",
        quote_literal(admin.name),
        quote_literal(admin.code),
        role_id(admin.role)
    );
    out.push_str("    ELSE\n        UPDATE usuarios\n");
    let _ = writeln!(out, "        SET nome = {},", quote_literal(admin.name));
    out.push_str("            ativo = true,\n");
    let _ = writeln!(out, "            perfil_id = {}", role_id(admin.role));
    let _ = writeln!(out, "        WHERE codigo = {};", quote_literal(admin.code));
    out.push_str("    END IF;\nEND $$;\n\n");

    section(&mut out, "5. FORMAS DE PAGAMENTO PADRÃO");
    out.push_str("-- Tabela: formas_pagamento (id, nome, descricao, ativo, created_at)\n");
    out.push_str("-- NOTA: Esta tabela NÃO tem coluna \"tipo\"!\n\n");
    out.push_str("DO $$\nBEGIN\n");
    for (i, m) in catalog.payment_methods.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        guarded_insert(
            &mut out,
            "formas_pagamento",
            ("nome", m.name),
            "nome, descricao",
            &[m.name, m.description],
        );
    }
    out.push_str("END $$;\n\n");

    for (number, title, table, entries) in [
        (6, "FAMÍLIAS DE PRODUTOS PADRÃO", "familias", &catalog.families),
        (7, "SETORES PADRÃO", "setores", &catalog.sectors),
    ] {
        section(&mut out, &format!("{}. {}", number, title));
        let _ = writeln!(
            out,
            "-- Tabela: {} (id, nome, descricao, ativo, created_at)\n",
            table
        );
        out.push_str("DO $$\nBEGIN\n");
        for (i, e) in entries.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            guarded_insert(
                &mut out,
                table,
                ("nome", e.name),
                "nome, descricao",
                &[e.name, e.description],
            );
        }
        out.push_str("END $$;\n\n");
    }

    section(&mut out, "FIM DOS DADOS INICIAIS");
    out.push_str("\n-- Mensagem de sucesso\nDO $$\nBEGIN\n");
    let notice_rule = format!("    RAISE NOTICE '{}';\n", "=".repeat(52));
    out.push_str(&notice_rule);
    out.push_str("    RAISE NOTICE 'BASE DE DADOS CRIADA COM SUCESSO!';\n");
    out.push_str(&notice_rule);
    let _ = writeln!(
        out,
        "    RAISE NOTICE {};",
        quote_literal(&format!("Usuário padrão: {}", admin.name))
    );
    let _ = writeln!(
        out,
        "    RAISE NOTICE {};",
        quote_literal(&format!("Código: {}", admin.code))
    );
    out.push_str(&notice_rule);
    out.push_str("END $$;\n\n");

    out.push_str("-- Verificar dados inseridos\n");
    for (label, table) in [
        ("perfis de usuário criados", "perfis_usuario"),
        ("permissões criadas", "permissoes"),
        ("formas de pagamento criadas", "formas_pagamento"),
        ("famílias criadas", "familias"),
        ("setores criados", "setores"),
        ("usuários criados", "usuarios"),
    ] {
        let _ = writeln!(
            out,
            "SELECT COUNT(*) || {} as info FROM {};",
            quote_literal(&format!(" {}", label)),
            table
        );
    }
    out.push('\n');
    out
}

/// Banner placed in front of a hand-written data file by the `simple` variant.
pub fn render_simple_banner() -> String {
    let mut out = String::from("\n");
    out.push_str(BANNER);
    out.push('\n');
    out.push_str(SIMPLE_BLOCK_TITLE);
    out.push('\n');
    out.push_str("-- Adicionado automaticamente por faturix-tools seed --variant simple\n");
    out.push_str("-- NOTA: Permissões devem ser configuradas manualmente\n");
    out.push_str(BANNER);
    out.push_str("\n\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_block_contains_every_catalog_row() {
        let catalog = SeedCatalog::pos_defaults();
        let sql = render_upsert_block(&catalog);

        assert!(sql.contains(SEED_BLOCK_TITLE));
        for p in &catalog.permissions {
            assert!(sql.contains(&format!("('{}', ", p.code)), "missing {}", p.code);
        }
        assert!(sql.contains("('POS/Cartão', 'POS')"));
        assert!(sql.contains("    -- Relatórios\n"));
        assert_eq!(sql.matches("ON CONFLICT (nome) DO NOTHING;").count(), 4);
        assert_eq!(sql.matches("ON CONFLICT (codigo) DO NOTHING;").count(), 1);
        assert!(sql.contains(
            "ON CONFLICT (codigo) DO UPDATE SET nome = 'Admin', ativo = true;"
        ));
    }

    #[test]
    fn test_upsert_permissions_list_ends_without_trailing_comma() {
        let sql = render_upsert_block(&SeedCatalog::pos_defaults());
        assert!(sql.contains(
            "('gestao_mesas', 'Gestão de Mesas', 'ADMIN', 'Permitir criar e editar mesas')\nON CONFLICT (codigo) DO NOTHING;"
        ));
    }

    #[test]
    fn test_guarded_block_has_no_upserts() {
        let catalog = SeedCatalog::pos_defaults();
        let sql = render_guarded_block(&catalog);

        assert!(!sql.contains("ON CONFLICT"));
        assert_eq!(
            sql.matches("IF NOT EXISTS").count(),
            catalog.roles.len()
                + catalog.permissions.len()
                + 1
                + catalog.payment_methods.len()
                + catalog.families.len()
                + catalog.sectors.len()
        );
        assert!(sql.contains("INSERT INTO formas_pagamento (nome, descricao)"));
        assert!(!sql.contains("(nome, tipo)"));
        assert!(sql.contains("RAISE NOTICE 'Código: 0000';"));
    }

    #[test]
    fn test_guarded_block_balances_do_blocks() {
        let sql = render_guarded_block(&SeedCatalog::pos_defaults());
        assert_eq!(sql.matches("DO $$").count(), sql.matches("END $$;").count());
    }
}
