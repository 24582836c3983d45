//! Document request message sent to clients before tax season.
//!
//! The message is plain text with WhatsApp formatting (`*bold*`) and
//! `- [ ]` check boxes, ready to paste into a chat or e-mail.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Greeting name used when none is given.
pub const DEFAULT_CLIENT_NAME: &str = "Prezado(a) Cliente";

/// What the client's situation looks like this year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientProfile {
    pub name: String,
    /// Salaried employment.
    pub salary: bool,
    pub dependents: bool,
    /// Pays rent.
    pub rent: bool,
    pub health: bool,
    pub education: bool,
    /// Bank accounts or investments.
    pub investments: bool,
}

impl Default for ClientProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_CLIENT_NAME.to_string(),
            salary: true,
            dependents: false,
            rent: false,
            health: false,
            education: false,
            investments: false,
        }
    }
}

impl ClientProfile {
    fn has_deductions(&self) -> bool {
        self.health || self.education || self.rent || self.dependents
    }
}

/// Build the request message for `profile` and tax `year`.
pub fn build_message(profile: &ClientProfile, year: i32) -> String {
    let name = match profile.name.trim() {
        "" => DEFAULT_CLIENT_NAME,
        name => name,
    };

    let mut text = format!("Olá, *{}*! Tudo bem?\n\n", name);
    text.push_str(&format!(
        "Chegou a hora de prepararmos sua declaração do Imposto de Renda {}.\n",
        year
    ));
    text.push_str(
        "Para garantir o melhor resultado possível, por favor, me envie os seguintes documentos:\n\n",
    );

    text.push_str("*1. BÁSICOS*\n");
    text.push_str("- [ ] Última declaração de IR (se tiver)\n");
    text.push_str("- [ ] Comprovante de endereço atualizado\n\n");

    if profile.salary {
        text.push_str("*2. RENDA*\n");
        text.push_str("- [ ] Informe de Rendimentos da(s) empresa(s) onde trabalhou\n\n");
    }

    if profile.investments {
        text.push_str("*3. BANCOS E APLICAÇÕES*\n");
        text.push_str("- [ ] Informe de Rendimentos Financeiros (Bancos e Corretoras)\n\n");
    }

    if profile.has_deductions() {
        text.push_str("*4. DESPESAS E DEDUÇÕES*\n");

        if profile.health {
            text.push_str("- [ ] Recibos médicos/dentistas/psicólogos (com CPF do profissional)\n");
            text.push_str("- [ ] Extrato anual do Plano de Saúde\n");
        }
        if profile.education {
            text.push_str("- [ ] Comprovantes de mensalidade escolar/faculdade\n");
        }
        if profile.rent {
            text.push_str(
                "- [ ] Contrato de aluguel e comprovantes de pagamento (com CPF do dono)\n",
            );
        }
        if profile.dependents {
            text.push_str("- [ ] CPF e data de nascimento de todos os dependentes\n");
            text.push_str("- [ ] Despesas médicas/escolares dos dependentes\n");
        }
    }

    text.push_str("\nFico no aguardo para iniciarmos! 🚀");
    text
}

/// Build the message for the current calendar year.
pub fn build_message_for_current_year(profile: &ClientProfile) -> String {
    build_message(profile, chrono::Local::now().year())
}
