//! Reference rows every fresh installation starts with.

use crate::utils::error::{Result, ToolingError};
use crate::utils::validation::{validate_unique, Validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Role {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    pub code: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentMethod {
    pub name: &'static str,
    pub kind: &'static str,
    pub description: &'static str,
}

/// Shared shape of `familias` and `setores` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedEntry {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminUser {
    pub name: &'static str,
    pub code: &'static str,
    pub role: &'static str,
}

#[derive(Debug, Clone)]
pub struct SeedCatalog {
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
    /// Roles that receive every active permission.
    pub full_access_roles: Vec<&'static str>,
    pub admin: AdminUser,
    pub payment_methods: Vec<PaymentMethod>,
    pub families: Vec<NamedEntry>,
    pub sectors: Vec<NamedEntry>,
}

const fn perm(
    code: &'static str,
    name: &'static str,
    category: &'static str,
    description: &'static str,
) -> Permission {
    Permission {
        code,
        name,
        category,
        description,
    }
}

const fn entry(name: &'static str, description: &'static str) -> NamedEntry {
    NamedEntry { name, description }
}

impl SeedCatalog {
    pub fn pos_defaults() -> Self {
        Self {
            roles: vec![
                Role { name: "Super Administrador", description: "Acesso total ao sistema" },
                Role {
                    name: "Administrador",
                    description: "Administrador com acesso a relatórios e configurações",
                },
                Role { name: "Gerente", description: "Gerente com acesso a relatórios" },
                Role { name: "Operador", description: "Operador de caixa básico" },
                Role { name: "Vendedor", description: "Vendedor sem acesso administrativo" },
            ],
            permissions: vec![
                perm("efectuar_pagamento", "Efectuar Pagamento", "VENDAS", "Permitir processar pagamentos de vendas"),
                perm("fechar_caixa", "Fechar Caixa", "VENDAS", "Permitir fechar o caixa"),
                perm("cancelar_venda", "Cancelar Venda", "VENDAS", "Permitir cancelar vendas"),
                perm("imprimir_conta", "Imprimir Conta", "VENDAS", "Permitir imprimir contas"),
                perm("entrada_stock", "Entrada de Stock", "STOCK", "Permitir registar entradas de stock"),
                perm("acerto_stock", "Acerto de Stock", "STOCK", "Permitir fazer acertos de stock"),
                perm("ver_stock", "Ver Stock", "STOCK", "Permitir visualizar stock"),
                perm("gestao_faturas", "Gestão de Faturas", "STOCK", "Permitir visualizar e editar faturas de entrada"),
                perm("gestao_produtos", "Gestão de Produtos", "CADASTROS", "Permitir criar e editar produtos"),
                perm("gestao_familias", "Gestão de Famílias", "CADASTROS", "Permitir criar e editar famílias"),
                perm("gestao_clientes", "Gestão de Clientes", "CADASTROS", "Permitir criar e editar clientes"),
                perm("gestao_fornecedores", "Gestão de Fornecedores", "CADASTROS", "Permitir criar e editar fornecedores"),
                perm("gestao_setores", "Gestão de Setores", "CADASTROS", "Permitir criar e editar setores"),
                perm("gestao_areas", "Gestão de Áreas", "CADASTROS", "Permitir criar e editar áreas"),
                perm("gestao_despesas", "Gestão de Despesas", "FINANCEIRO", "Permitir criar e editar despesas"),
                perm("gestao_dividas", "Gestão de Dívidas", "FINANCEIRO", "Permitir registar e gerenciar dívidas"),
                perm("gestao_pagamentos", "Gestão de Formas de Pagamento", "FINANCEIRO", "Permitir configurar formas de pagamento"),
                perm("visualizar_relatorios", "Visualizar Relatórios", "RELATORIOS", "Permitir visualizar relatórios gerais"),
                perm("visualizar_margens", "Visualizar Margens", "RELATORIOS", "Permitir visualizar margens e lucros"),
                perm("visualizar_stock", "Visualizar Relatório de Stock", "RELATORIOS", "Permitir visualizar relatório de stock"),
                perm("acesso_admin", "Acesso Administração", "ADMIN", "Permitir acesso ao módulo de administração"),
                perm("gestao_usuarios", "Gestão de Usuários", "ADMIN", "Permitir criar e editar usuários"),
                perm("gestao_perfis", "Gestão de Perfis", "ADMIN", "Permitir criar e editar perfis"),
                perm("gestao_permissoes", "Gestão de Permissões", "ADMIN", "Permitir configurar permissões por perfil"),
                perm("configuracoes_sistema", "Configurações do Sistema", "ADMIN", "Permitir alterar configurações gerais"),
                perm("gestao_empresa", "Gestão de Empresa", "ADMIN", "Permitir editar dados da empresa"),
                perm("gestao_mesas", "Gestão de Mesas", "ADMIN", "Permitir criar e editar mesas"),
            ],
            full_access_roles: vec!["Super Administrador", "Administrador"],
            admin: AdminUser {
                name: "Admin",
                code: "0000",
                role: "Super Administrador",
            },
            payment_methods: vec![
                PaymentMethod { name: "Dinheiro", kind: "CASH", description: "Pagamento em dinheiro" },
                PaymentMethod { name: "Emola", kind: "EMOLA", description: "Pagamento via Emola" },
                PaymentMethod { name: "M-Pesa", kind: "MPESA", description: "Pagamento via M-Pesa" },
                PaymentMethod { name: "POS/Cartão", kind: "POS", description: "Pagamento via POS ou cartão" },
                PaymentMethod { name: "Transferência", kind: "TRANSFERENCIA", description: "Transferência bancária" },
                PaymentMethod { name: "Crédito", kind: "CREDITO", description: "Venda a crédito" },
            ],
            families: vec![
                entry("BEBIDAS", "Bebidas em geral"),
                entry("COMIDAS", "Pratos e lanches"),
                entry("SOBREMESAS", "Doces e sobremesas"),
                entry("PETISCOS", "Petiscos e aperitivos"),
                entry("OUTROS", "Outros produtos"),
            ],
            sectors: vec![
                entry("BAR", "Bar e bebidas"),
                entry("COZINHA", "Cozinha e pratos quentes"),
                entry("CONFEITARIA", "Doces e sobremesas"),
                entry("DIVERSOS", "Produtos diversos"),
            ],
        }
    }

    /// Permission categories in first-seen order.
    pub fn permission_categories(&self) -> Vec<&'static str> {
        let mut categories: Vec<&'static str> = Vec::new();
        for permission in &self.permissions {
            if !categories.contains(&permission.category) {
                categories.push(permission.category);
            }
        }
        categories
    }
}

impl Default for SeedCatalog {
    fn default() -> Self {
        Self::pos_defaults()
    }
}

impl Validate for SeedCatalog {
    fn validate(&self) -> Result<()> {
        validate_unique("perfis_usuario", self.roles.iter().map(|r| r.name))?;
        validate_unique("permissoes", self.permissions.iter().map(|p| p.code))?;
        validate_unique("formas_pagamento", self.payment_methods.iter().map(|m| m.name))?;
        validate_unique("familias", self.families.iter().map(|f| f.name))?;
        validate_unique("setores", self.sectors.iter().map(|s| s.name))?;

        let referenced = self
            .full_access_roles
            .iter()
            .copied()
            .chain(std::iter::once(self.admin.role));
        for name in referenced {
            if !self.roles.iter().any(|role| role.name == name) {
                return Err(ToolingError::ValidationError {
                    message: format!("Role '{}' is referenced but not defined", name),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_sizes() {
        let catalog = SeedCatalog::pos_defaults();
        assert_eq!(catalog.roles.len(), 5);
        assert_eq!(catalog.permissions.len(), 27);
        assert_eq!(catalog.payment_methods.len(), 6);
        assert_eq!(catalog.families.len(), 5);
        assert_eq!(catalog.sectors.len(), 4);
    }

    #[test]
    fn test_default_catalog_is_valid() {
        assert!(SeedCatalog::pos_defaults().validate().is_ok());
    }

    #[test]
    fn test_duplicate_payment_method_rejected() {
        let mut catalog = SeedCatalog::pos_defaults();
        let first = catalog.payment_methods[0];
        catalog.payment_methods.push(first);
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_unknown_admin_role_rejected() {
        let mut catalog = SeedCatalog::pos_defaults();
        catalog.admin.role = "Dono";
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_permission_categories_in_order() {
        let catalog = SeedCatalog::pos_defaults();
        assert_eq!(
            catalog.permission_categories(),
            vec!["VENDAS", "STOCK", "CADASTROS", "FINANCEIRO", "RELATORIOS", "ADMIN"]
        );
    }
}
