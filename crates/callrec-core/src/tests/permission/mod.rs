mod consent_store;
